//! HTTP client for the IPFS artifact store
//!
//! Uploads build artifacts through the store's `api/v0/add` endpoint and
//! returns the content hash under which the artifact is addressable.

use super::ContentHash;
use anyhow::{anyhow, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default request timeout for store uploads
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Response returned by `api/v0/add`
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// Client for a single IPFS node
pub struct IpfsClient {
    endpoint: Url,
    http: Client,
}

impl IpfsClient {
    /// Creates a client for the given node address.
    ///
    /// Accepts either a full URL or a bare `host:port` pair, which is
    /// assumed to speak plain HTTP.
    pub fn new(address: &str) -> Result<Self> {
        let normalized = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };

        let endpoint = Url::parse(&normalized)
            .with_context(|| format!("invalid IPFS node address '{}'", address))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to construct HTTP client")?;

        Ok(Self { endpoint, http })
    }

    /// Uploads one file's contents, returning its content hash
    pub async fn add(&self, file_name: &str, bytes: Vec<u8>) -> Result<ContentHash> {
        let url = self
            .endpoint
            .join("api/v0/add")
            .context("failed to build upload URL")?;

        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        debug!(%url, file_name, "Uploading artifact to IPFS");

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .context("upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("IPFS node returned {}", status));
        }

        let added: AddResponse = response
            .json()
            .await
            .context("unexpected response from IPFS node")?;

        Ok(ContentHash::new(added.hash))
    }
}
