//! Deployment to the Graph node
//!
//! Address normalization, the authenticated JSON-RPC transport, the deploy
//! call itself, and the coalescing queue that serializes deploys in watch
//! mode.

pub mod client;
pub mod queue;
pub mod transport;

pub use client::{AddressError, DeployOutcome, DeployTarget, DeploymentClient, DEFAULT_DEPLOY_PORT};
pub use queue::DeployQueue;
pub use transport::{HttpTransport, JsonRpcResponse, JsonRpcTransport, TransportFailure};
