//! Pipeline driver
//!
//! Sequences the whole invocation: migrations gate the pipeline, then
//! either a one-shot compile -> deploy sequence or a long-running
//! watch -> deploy loop runs. All failures propagate as values; the
//! command handler owns the exit status.

use crate::build::BuildOrchestrator;
use crate::compiler::BuildEvent;
use crate::config::PipelineConfig;
use crate::deploy::{DeployOutcome, DeployQueue, DeploymentClient};
use crate::error::PipelineError;
use crate::migrations;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Channel capacity for build events; watch mode produces at most one
/// event per poll cycle, so a small buffer suffices
const EVENT_BUFFER: usize = 16;

pub struct PipelineDriver {
    config: Arc<PipelineConfig>,
    orchestrator: BuildOrchestrator,
}

impl PipelineDriver {
    pub fn new(config: Arc<PipelineConfig>, orchestrator: BuildOrchestrator) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    /// Runs migrations, then compiles without deploying. Honors the watch
    /// flag.
    pub async fn build(&self) -> Result<(), PipelineError> {
        migrations::apply_migrations(&self.config).await?;

        if self.config.watch {
            return self.watch_build().await;
        }

        match self.orchestrator.compile_once().await {
            BuildEvent::Built(hash) => {
                info!("Subgraph built: {}", hash);
                Ok(())
            }
            BuildEvent::BuildFailed => Err(PipelineError::BuildFailed),
        }
    }

    /// Runs migrations, then compiles and deploys. Honors the watch flag.
    ///
    /// The caller has already validated the deploy preconditions and built
    /// the client from the normalized target.
    pub async fn deploy(
        &self,
        client: &DeploymentClient,
        name: &str,
    ) -> Result<(), PipelineError> {
        migrations::apply_migrations(&self.config).await?;

        if self.config.watch {
            self.watch_deploy(client, name).await
        } else {
            self.deploy_once(client, name).await
        }
    }

    async fn deploy_once(
        &self,
        client: &DeploymentClient,
        name: &str,
    ) -> Result<(), PipelineError> {
        match self.orchestrator.compile_once().await {
            // Compilation failed, not deploying; the compiler already
            // reported the details.
            BuildEvent::BuildFailed => Err(PipelineError::BuildFailed),
            BuildEvent::Built(hash) => report_outcome(client.deploy(name, &hash).await),
        }
    }

    async fn watch_build(&self) -> Result<(), PipelineError> {
        let (events, mut received) = mpsc::channel::<BuildEvent>(EVENT_BUFFER);

        let log = async move {
            while let Some(event) = received.recv().await {
                if let BuildEvent::Built(hash) = event {
                    info!("Subgraph built: {}", hash);
                }
            }
        };

        let (watch_result, ()) = tokio::join!(self.orchestrator.watch_and_compile(events), log);
        watch_result.map_err(PipelineError::from)
    }

    /// Watch loop: every successful rebuild queues its hash for deploy,
    /// failed rebuilds just wait for the next change. Deploys are
    /// serialized through a single-slot queue, so rapid rebuilds supersede
    /// a pending deploy instead of overlapping with an in-flight one.
    async fn watch_deploy(
        &self,
        client: &DeploymentClient,
        name: &str,
    ) -> Result<(), PipelineError> {
        let (events, mut received) = mpsc::channel::<BuildEvent>(EVENT_BUFFER);
        let queue = Arc::new(DeployQueue::new());

        let watch_and_forward = {
            let queue = queue.clone();
            async move {
                let forward = async {
                    while let Some(event) = received.recv().await {
                        match event {
                            BuildEvent::Built(hash) => queue.submit(hash),
                            BuildEvent::BuildFailed => {}
                        }
                    }
                    queue.close();
                };
                let (watch_result, ()) =
                    tokio::join!(self.orchestrator.watch_and_compile(events), forward);
                watch_result
            }
        };

        let worker = async {
            while let Some(hash) = queue.next().await {
                report_outcome(client.deploy(name, &hash).await)?;
            }
            Ok::<(), PipelineError>(())
        };

        tokio::pin!(watch_and_forward);
        tokio::pin!(worker);

        tokio::select! {
            watch_result = &mut watch_and_forward => {
                watch_result?;
                // Session torn down; drain any outstanding deploy.
                worker.await
            }
            worker_result = &mut worker => {
                worker_result?;
                watch_and_forward.await.map_err(PipelineError::from)
            }
        }
    }
}

fn report_outcome(outcome: DeployOutcome) -> Result<(), PipelineError> {
    match outcome {
        DeployOutcome::Deployed { location } => {
            info!("Deployed to Graph node: {}", location);
            Ok(())
        }
        DeployOutcome::TransportError { code } => Err(PipelineError::Transport { code }),
        DeployOutcome::ProtocolError { message } => Err(PipelineError::Protocol { message }),
    }
}
