//! Command handlers
//!
//! Each handler builds the immutable pipeline configuration, wires the
//! components together, and maps the driver's result to an exit code. This
//! is the single place where fatal errors are reported and the invocation
//! ends.

use super::commands::{BuildArgs, DeployArgs};
use crate::build::BuildOrchestrator;
use crate::compiler::{ManifestCompiler, SubgraphCompiler};
use crate::config::PipelineConfig;
use crate::deploy::{DeployTarget, DeploymentClient};
use crate::error::PipelineError;
use crate::pipeline::PipelineDriver;
use std::sync::Arc;
use tracing::error;

pub async fn handle_build(args: &BuildArgs, verbosity: Option<&str>) -> i32 {
    let config = Arc::new(args.to_config(verbosity));

    let driver = match driver_for(&config) {
        Ok(driver) => driver,
        Err(code) => return code,
    };

    finish(driver.build().await)
}

pub async fn handle_deploy(args: &DeployArgs, verbosity: Option<&str>) -> i32 {
    let config = Arc::new(args.to_config(verbosity));

    // Deploy preconditions come first: nothing is attempted until every
    // required setting is present.
    let settings = match config.deploy_settings() {
        Ok(settings) => settings,
        Err(e) => {
            for setting in e.missing() {
                error!("No {} specified", setting);
            }
            // Usage-style output, raw like --help rather than a log line.
            eprintln!("{}", config);
            error!("Run 'graphpack deploy --help' for usage");
            return finish(Err(e.into()));
        }
    };

    let target = match DeployTarget::normalize(settings.node, config.api_key.as_deref()) {
        Ok(target) => target,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };
    let client = DeploymentClient::new(target);
    let name = settings.subgraph_name.to_string();

    let driver = match driver_for(&config) {
        Ok(driver) => driver,
        Err(code) => return code,
    };

    finish(driver.deploy(&client, &name).await)
}

fn driver_for(config: &Arc<PipelineConfig>) -> Result<PipelineDriver, i32> {
    let compiler: Arc<dyn ManifestCompiler> = match SubgraphCompiler::new(config) {
        Ok(compiler) => Arc::new(compiler),
        Err(e) => {
            error!("{:#}", e);
            return Err(1);
        }
    };
    let orchestrator = BuildOrchestrator::new(compiler);
    Ok(PipelineDriver::new(config.clone(), orchestrator))
}

/// Maps the driver result to the invocation's exit code, reporting fatal
/// errors exactly once
fn finish(result: Result<(), PipelineError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            if !e.already_reported() {
                error!("{}", e);
            }
            1
        }
    }
}
