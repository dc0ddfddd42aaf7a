//! Shared test doubles for the pipeline integration tests

use async_trait::async_trait;
use graphpack::compiler::{BuildEvent, ContentHash, ManifestCompiler, WatchError};
use graphpack::config::{OutputFormat, PipelineConfig};
use graphpack::deploy::{JsonRpcResponse, JsonRpcTransport, TransportFailure};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// One step of a scripted watch session
pub enum WatchStep {
    Emit(BuildEvent),
    Pause(Duration),
}

/// Scripted compiler standing in for the external collaborator
pub struct MockCompiler {
    one_shot: Mutex<Vec<Option<ContentHash>>>,
    watch_script: Mutex<Vec<WatchStep>>,
    watch_setup_failure: bool,
    compiles: AtomicUsize,
}

impl MockCompiler {
    pub fn one_shot(result: Option<ContentHash>) -> Self {
        Self {
            one_shot: Mutex::new(vec![result]),
            watch_script: Mutex::new(Vec::new()),
            watch_setup_failure: false,
            compiles: AtomicUsize::new(0),
        }
    }

    pub fn watching(script: Vec<WatchStep>) -> Self {
        Self {
            one_shot: Mutex::new(Vec::new()),
            watch_script: Mutex::new(script),
            watch_setup_failure: false,
            compiles: AtomicUsize::new(0),
        }
    }

    pub fn broken_watch() -> Self {
        Self {
            one_shot: Mutex::new(Vec::new()),
            watch_script: Mutex::new(Vec::new()),
            watch_setup_failure: true,
            compiles: AtomicUsize::new(0),
        }
    }

    pub fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestCompiler for MockCompiler {
    async fn compile(&self) -> Option<ContentHash> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        self.one_shot.lock().unwrap().pop().flatten()
    }

    async fn watch_and_compile(
        &self,
        events: mpsc::Sender<BuildEvent>,
    ) -> Result<(), WatchError> {
        if self.watch_setup_failure {
            return Err(WatchError::Setup {
                path: PathBuf::from("/watched"),
                reason: "inotify limit reached".to_string(),
            });
        }

        let script = std::mem::take(&mut *self.watch_script.lock().unwrap());
        for step in script {
            match step {
                WatchStep::Emit(event) => {
                    if events.send(event).await.is_err() {
                        return Ok(());
                    }
                }
                WatchStep::Pause(duration) => tokio::time::sleep(duration).await,
            }
        }
        Ok(())
    }
}

/// Transport double recording every call and replaying scripted results
pub struct RecordingTransport {
    calls: Mutex<Vec<(String, serde_json::Value)>>,
    results: Mutex<Vec<Result<JsonRpcResponse, TransportFailure>>>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    /// Accepts every call with a success response
    pub fn accepting() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            results: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Replays the given results in order, then keeps succeeding
    pub fn scripted(results: Vec<Result<JsonRpcResponse, TransportFailure>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            results: Mutex::new(results),
            delay: None,
        }
    }

    /// Simulates a slow node; every call takes `delay` to complete
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deployed_hashes(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|(_, params)| {
                params
                    .get("ipfs_hash")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .collect()
    }
}

#[async_trait]
impl JsonRpcTransport for RecordingTransport {
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<JsonRpcResponse, TransportFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut results = self.results.lock().unwrap();
        if results.is_empty() {
            Ok(JsonRpcResponse::default())
        } else {
            results.remove(0)
        }
    }
}

/// Pipeline configuration pointing at a manifest on disk
pub fn config_for(manifest: &Path, watch: bool) -> PipelineConfig {
    PipelineConfig {
        manifest: manifest.to_path_buf(),
        output_dir: manifest.parent().unwrap().join("dist"),
        output_format: OutputFormat::Wasm,
        ipfs: Some("localhost:5001".to_string()),
        node: Some("http://localhost:8020".to_string()),
        subgraph_name: Some("user/subgraph".to_string()),
        api_key: None,
        verbosity: None,
        watch,
    }
}
