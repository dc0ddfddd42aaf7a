use graphpack::cli::commands::{CliArgs, Commands};
use graphpack::cli::handlers::{handle_build, handle_deploy};
use graphpack::util::logging::{init_logging, parse_level, LoggingConfig};
use graphpack::VERSION;

use clap::Parser;
use std::env;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("graphpack v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let verbosity = args.verbosity.as_deref();
    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args, verbosity).await,
        Commands::Deploy(deploy_args) => handle_deploy(deploy_args, verbosity).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = match &args.verbosity {
        Some(level_str) => parse_level(level_str),
        None => {
            let level_str = env::var("LOG_LEVEL")
                .or_else(|_| env::var("GRAPHPACK_LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string());
            parse_level(&level_str)
        }
    };

    init_logging(LoggingConfig::with_level(level));
}
