//! Shipping implementation of the manifest compiler
//!
//! Loads the subgraph manifest, assembles the build artifact into the
//! output directory, and publishes it to the configured IPFS node. The
//! compiler reports its own failures; callers observe them only as a
//! missing content hash.

use super::watcher::ManifestWatcher;
use super::{BuildEvent, ContentHash, IpfsClient, ManifestCompiler, WatchError};
use crate::config::{OutputFormat, PipelineConfig};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_yaml::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// File name of the normalized manifest inside the output directory
const ARTIFACT_MANIFEST: &str = "subgraph.yaml";

pub struct SubgraphCompiler {
    manifest: PathBuf,
    output_dir: PathBuf,
    output_format: OutputFormat,
    ipfs: Option<IpfsClient>,
}

impl SubgraphCompiler {
    /// Builds a compiler from the pipeline configuration, connecting to the
    /// IPFS node if one is configured
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let ipfs = config
            .ipfs
            .as_deref()
            .map(IpfsClient::new)
            .transpose()
            .context("failed to connect to the IPFS node")?;

        Ok(Self {
            manifest: config.manifest.clone(),
            output_dir: config.output_dir.clone(),
            output_format: config.output_format,
            ipfs,
        })
    }

    async fn compile_inner(&self) -> Result<ContentHash> {
        let raw = tokio::fs::read_to_string(&self.manifest)
            .await
            .with_context(|| format!("failed to read manifest {}", self.manifest.display()))?;

        let document: Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse manifest {}", self.manifest.display()))?;
        validate_manifest(&document)?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create output directory {}",
                    self.output_dir.display()
                )
            })?;

        // Normalized manifest is the canonical artifact entry point.
        let normalized =
            serde_yaml::to_string(&document).context("failed to serialize manifest")?;
        let manifest_out = self.output_dir.join(ARTIFACT_MANIFEST);
        tokio::fs::write(&manifest_out, &normalized)
            .await
            .with_context(|| format!("failed to write {}", manifest_out.display()))?;

        let mut digest = Sha256::new();
        digest.update(normalized.as_bytes());

        for source in mapping_files(&document) {
            let resolved = self.resolve(&source);
            let bytes = tokio::fs::read(&resolved)
                .await
                .with_context(|| format!("failed to read mapping {}", resolved.display()))?;

            let stem = resolved
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("mapping");
            let target = self
                .output_dir
                .join(format!("{}.{}", stem, self.output_format.extension()));
            tokio::fs::write(&target, &bytes)
                .await
                .with_context(|| format!("failed to write {}", target.display()))?;
            debug!(mapping = %resolved.display(), artifact = %target.display(), "Assembled mapping");

            digest.update(&bytes);
        }

        match &self.ipfs {
            Some(ipfs) => {
                let hash = ipfs
                    .add(ARTIFACT_MANIFEST, normalized.into_bytes())
                    .await
                    .context("failed to upload the subgraph to IPFS")?;
                Ok(hash)
            }
            None => Ok(ContentHash::new(hex::encode(digest.finalize()))),
        }
    }

    /// Resolves a path from the manifest relative to the manifest's directory
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.manifest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ManifestCompiler for SubgraphCompiler {
    async fn compile(&self) -> Option<ContentHash> {
        info!("Compiling subgraph: {}", self.manifest.display());
        match self.compile_inner().await {
            Ok(hash) => {
                info!("Completed subgraph build: {}", hash);
                Some(hash)
            }
            Err(e) => {
                error!("Failed to compile subgraph: {:#}", e);
                None
            }
        }
    }

    async fn watch_and_compile(
        &self,
        events: mpsc::Sender<BuildEvent>,
    ) -> Result<(), WatchError> {
        let watcher = ManifestWatcher::new(&self.manifest, &self.output_dir)?;
        info!(
            "Watching subgraph files under {}",
            watcher.root().display()
        );

        // Initial build on session start, then one per detected change.
        let mut snapshot = watcher.snapshot();
        let event = match self.compile().await {
            Some(hash) => BuildEvent::Built(hash),
            None => BuildEvent::BuildFailed,
        };
        if events.send(event).await.is_err() {
            return Ok(());
        }

        loop {
            // Torn down as soon as the consumer goes away, even while idle
            // between change events.
            tokio::select! {
                _ = events.closed() => return Ok(()),
                _ = watcher.wait_for_change(&snapshot) => {}
            }
            let event = match self.compile().await {
                Some(hash) => BuildEvent::Built(hash),
                None => BuildEvent::BuildFailed,
            };
            if events.send(event).await.is_err() {
                return Ok(());
            }
            // Re-snapshot after the build so edits made while compiling are
            // picked up by the next poll, not lost.
            snapshot = watcher.snapshot();
        }
    }
}

/// Minimal structural validation; manifest language semantics are out of
/// scope for the pipeline
fn validate_manifest(document: &Value) -> Result<()> {
    if document.as_mapping().is_none() {
        return Err(anyhow!("manifest is not a YAML mapping"));
    }
    if document.get("specVersion").is_none() {
        return Err(anyhow!("manifest has no specVersion"));
    }
    Ok(())
}

/// Mapping files referenced by the manifest's data sources
fn mapping_files(document: &Value) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Some(sources) = document.get("dataSources").and_then(Value::as_sequence) else {
        return files;
    };
    for source in sources {
        if let Some(file) = source
            .get("mapping")
            .and_then(|m| m.get("file"))
            .and_then(Value::as_str)
        {
            files.push(PathBuf::from(file));
        }
    }
    files
}
