//! Build orchestration over the compiler collaborator
//!
//! Exposes a single-build mode and a continuous watch-build mode, both
//! yielding [`BuildEvent`]s. The orchestrator never re-reports compile
//! failures; the compiler already did.

use crate::compiler::{BuildEvent, ManifestCompiler, WatchError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

pub struct BuildOrchestrator {
    compiler: Arc<dyn ManifestCompiler>,
}

impl BuildOrchestrator {
    pub fn new(compiler: Arc<dyn ManifestCompiler>) -> Self {
        Self { compiler }
    }

    /// Runs one build, yielding a content hash or a failure signal
    pub async fn compile_once(&self) -> BuildEvent {
        match self.compiler.compile().await {
            Some(hash) => {
                debug!("Build produced content hash {}", hash);
                BuildEvent::Built(hash)
            }
            None => BuildEvent::BuildFailed,
        }
    }

    /// Runs a persistent watch session, emitting one event per detected
    /// change on `events`. A failed rebuild does not end the session; only
    /// a setup failure of the watch mechanism returns an error.
    pub async fn watch_and_compile(
        &self,
        events: mpsc::Sender<BuildEvent>,
    ) -> Result<(), WatchError> {
        self.compiler.watch_and_compile(events).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ContentHash;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedCompiler {
        results: Mutex<Vec<Option<ContentHash>>>,
    }

    #[async_trait]
    impl ManifestCompiler for ScriptedCompiler {
        async fn compile(&self) -> Option<ContentHash> {
            self.results.lock().unwrap().remove(0)
        }

        async fn watch_and_compile(
            &self,
            events: mpsc::Sender<BuildEvent>,
        ) -> Result<(), WatchError> {
            loop {
                let next = {
                    let mut results = self.results.lock().unwrap();
                    if results.is_empty() {
                        return Ok(());
                    }
                    results.remove(0)
                };
                let event = match next {
                    Some(hash) => BuildEvent::Built(hash),
                    None => BuildEvent::BuildFailed,
                };
                if events.send(event).await.is_err() {
                    return Ok(());
                }
            }
        }
    }

    #[tokio::test]
    async fn test_compile_once_maps_hash_to_built() {
        let orchestrator = BuildOrchestrator::new(Arc::new(ScriptedCompiler {
            results: Mutex::new(vec![Some(ContentHash::new("QmHash123"))]),
        }));

        assert_eq!(
            orchestrator.compile_once().await,
            BuildEvent::Built(ContentHash::new("QmHash123"))
        );
    }

    #[tokio::test]
    async fn test_compile_once_maps_missing_hash_to_failure() {
        let orchestrator = BuildOrchestrator::new(Arc::new(ScriptedCompiler {
            results: Mutex::new(vec![None]),
        }));

        assert_eq!(orchestrator.compile_once().await, BuildEvent::BuildFailed);
    }

    #[tokio::test]
    async fn test_watch_forwards_one_event_per_build() {
        let orchestrator = BuildOrchestrator::new(Arc::new(ScriptedCompiler {
            results: Mutex::new(vec![
                None,
                Some(ContentHash::new("QmA")),
                Some(ContentHash::new("QmB")),
            ]),
        }));

        let (tx, mut rx) = mpsc::channel(8);
        orchestrator.watch_and_compile(tx).await.unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                BuildEvent::BuildFailed,
                BuildEvent::Built(ContentHash::new("QmA")),
                BuildEvent::Built(ContentHash::new("QmB")),
            ]
        );
    }
}
