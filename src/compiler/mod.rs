//! Manifest compiler collaborator
//!
//! The pipeline treats the compiler as an external collaborator behind the
//! [`ManifestCompiler`] trait: one call compiles the manifest into a build
//! artifact and publishes it to the content-addressed store, yielding a
//! content hash. Compile failures are reported by the compiler itself and
//! surface as `None`; callers only learn *that* the build failed, never why.

pub mod ipfs;
pub mod subgraph;
pub mod watcher;

pub use ipfs::IpfsClient;
pub use subgraph::SubgraphCompiler;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;

/// Content-addressed identifier returned after the build artifact is
/// published to the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one compile cycle.
///
/// Emitted once for a one-shot build, or repeatedly (one per detected
/// change) in watch mode. A `BuildFailed` event never produces a deploy
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Built(ContentHash),
    BuildFailed,
}

/// Structural failure of a watch session.
///
/// A failed rebuild is *not* a watch error; it surfaces as a
/// [`BuildEvent::BuildFailed`] and watching continues. Only the watch
/// mechanism itself failing to start is fatal.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch {path}: {reason}")]
    Setup { path: PathBuf, reason: String },
}

/// Contract consumed by the build orchestrator
#[async_trait]
pub trait ManifestCompiler: Send + Sync {
    /// Compiles the manifest once. Returns the content hash on success, or
    /// `None` when the build failed; the failure has already been reported
    /// by the compiler.
    async fn compile(&self) -> Option<ContentHash>;

    /// Starts a persistent watch session, emitting exactly one
    /// [`BuildEvent`] per detected change. Does not return until the
    /// session is torn down (the receiver is dropped); returns an error
    /// only when the watch mechanism cannot start.
    async fn watch_and_compile(
        &self,
        events: mpsc::Sender<BuildEvent>,
    ) -> Result<(), WatchError>;
}
