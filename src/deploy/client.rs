//! Deployment client for the Graph node
//!
//! Normalizes the target node address, builds the authenticated RPC
//! transport, and performs the `subgraph_deploy` call, classifying each
//! call's outcome exactly once. No retries anywhere.

use super::transport::{HttpTransport, JsonRpcTransport};
use crate::compiler::ContentHash;
use reqwest::Url;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Default RPC port applied when the node address omits one
pub const DEFAULT_DEPLOY_PORT: u16 = 8020;

/// The configured node address could not be parsed
#[derive(Debug, Error)]
#[error("invalid Graph node address '{address}': {reason}")]
pub struct AddressError {
    pub address: String,
    pub reason: String,
}

/// Normalized deploy target, derived once from configuration
#[derive(Debug, Clone)]
pub struct DeployTarget {
    url: Url,
    api_key: Option<String>,
}

impl DeployTarget {
    /// Parses the node address, assigning the default port 8020 when none
    /// is present. All other URL components pass through unchanged.
    pub fn normalize(address: &str, api_key: Option<&str>) -> Result<Self, AddressError> {
        let mut url = Url::parse(address).map_err(|e| AddressError {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        if url.port().is_none() {
            url.set_port(Some(DEFAULT_DEPLOY_PORT))
                .map_err(|_| AddressError {
                    address: address.to_string(),
                    reason: "address does not accept a port".to_string(),
                })?;
        }

        Ok(Self {
            url,
            api_key: api_key.map(str::to_string),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

/// Terminal classification of one deploy call. The variants are mutually
/// exclusive and never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The node accepted the registration; `location` is the node address
    /// joined with the subgraph name
    Deployed { location: String },
    /// Connection/HTTP-level failure, with the originating error code
    TransportError { code: String },
    /// The remote node returned an application-level error
    ProtocolError { message: String },
}

/// Performs deploy calls against one normalized target
pub struct DeploymentClient {
    target: DeployTarget,
    transport: Arc<dyn JsonRpcTransport>,
}

impl DeploymentClient {
    /// Builds a client with an HTTP transport bound to the target
    pub fn new(target: DeployTarget) -> Self {
        let transport = Arc::new(HttpTransport::new(&target));
        Self { target, transport }
    }

    /// Builds a client over an existing transport
    pub fn with_transport(target: DeployTarget, transport: Arc<dyn JsonRpcTransport>) -> Self {
        Self { target, transport }
    }

    /// Issues one `subgraph_deploy` call for the given content hash
    pub async fn deploy(&self, name: &str, hash: &ContentHash) -> DeployOutcome {
        info!("Deploying to Graph node: {}", self.target.url());

        let params = serde_json::json!({
            "name": name,
            "ipfs_hash": hash.as_str(),
        });

        match self.transport.call("subgraph_deploy", params).await {
            Err(failure) => DeployOutcome::TransportError { code: failure.code },
            Ok(response) => match response.error {
                Some(error) => DeployOutcome::ProtocolError {
                    message: error.message,
                },
                None => DeployOutcome::Deployed {
                    location: self.location(name),
                },
            },
        }
    }

    /// The node address joined with the subgraph name
    fn location(&self, name: &str) -> String {
        let base = self.target.url().to_string();
        format!("{}/{}", base.trim_end_matches('/'), name)
    }
}
