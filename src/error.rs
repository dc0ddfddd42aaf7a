//! Pipeline failure taxonomy
//!
//! Every failure class is terminal for the unit of work it occurs in;
//! errors propagate as values to the command handler, which owns the
//! decision to end the invocation and its exit status. Only watch-mode
//! per-cycle build failures are non-terminal, and those never surface
//! here.

use crate::compiler::WatchError;
use crate::config::ConfigError;
use crate::migrations::MigrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required setting is absent; reported with the exact missing fields
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A migration failed, aborting the pipeline before any build attempt
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// The compiler signalled no hash. Details were already reported by
    /// the compiler; the invocation just completes non-zero without a
    /// deploy attempt.
    #[error("compilation failed, not deploying")]
    BuildFailed,

    /// Network/HTTP failure during deploy
    #[error("HTTP error deploying the subgraph: {code}")]
    Transport { code: String },

    /// The remote node rejected the deploy
    #[error("error deploying the subgraph: {message}")]
    Protocol { message: String },

    /// The watch session could not start
    #[error("failed to watch, compile or deploy the subgraph: {0}")]
    Watch(#[from] WatchError),
}

impl PipelineError {
    /// Whether the failure was already reported at its origin and needs no
    /// further output from the top-level handler. Build failures are logged
    /// by the compiler; missing settings are enumerated one by one on the
    /// guidance path before the configuration summary.
    pub fn already_reported(&self) -> bool {
        matches!(
            self,
            PipelineError::BuildFailed | PipelineError::Config(_)
        )
    }
}
