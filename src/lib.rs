//! graphpack - compiles subgraph manifests and deploys them to a Graph node
//!
//! This library drives the build-migrate-deploy pipeline for subgraphs. A
//! manifest is first brought forward across mapping-API revisions by the
//! migration runner, then compiled into a build artifact, published to a
//! content-addressed store (IPFS), and finally registered with a Graph node
//! over JSON-RPC. Both a one-shot mode and a continuous watch mode are
//! supported.
//!
//! # Core Concepts
//!
//! - **Migrations**: versioned, idempotent manifest transformations that run
//!   concurrently before any build is attempted
//! - **Build events**: every compile yields either a content hash or a
//!   failure signal; failures never reach the deploy step
//! - **Deploy outcomes**: a deploy call classifies exactly one of
//!   deployed / transport error / protocol error, with no retries
//!
//! # Project Structure
//!
//! - [`migrations`]: migration descriptors and the concurrent runner
//! - [`compiler`]: the manifest compiler collaborator and file watcher
//! - [`build`]: the build orchestrator wrapping the compiler
//! - [`deploy`]: node address normalization, JSON-RPC transport, deploy queue
//! - [`pipeline`]: the driver composing migrations, build, and deploy

pub mod build;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod deploy;
pub mod error;
pub mod migrations;
pub mod pipeline;
pub mod util;

// Re-export key types for convenient access
pub use build::BuildOrchestrator;
pub use compiler::{BuildEvent, ContentHash, ManifestCompiler, SubgraphCompiler, WatchError};
pub use config::{ConfigError, OutputFormat, PipelineConfig};
pub use deploy::{DeployOutcome, DeployTarget, DeploymentClient};
pub use error::PipelineError;
pub use migrations::{MigrationDescriptor, MigrationError, RunDecision};
pub use pipeline::PipelineDriver;
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
