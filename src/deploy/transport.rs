//! HTTP JSON-RPC transport
//!
//! The transport is configured once per invocation and then shared
//! read-only across deploy calls. When an API key is configured, every
//! outgoing request carries `Authorization: Bearer <key>`.

use super::DeployTarget;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

/// Connection/HTTP-level failure of a single RPC call; carries the
/// originating error code
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}")]
pub struct TransportFailure {
    pub code: String,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

/// Application-level error returned by the remote node
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// One round-trip to the remote node
#[async_trait]
pub trait JsonRpcTransport: Send + Sync {
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<JsonRpcResponse, TransportFailure>;
}

/// Transport bound to a normalized deploy target
pub struct HttpTransport {
    endpoint: Url,
    api_key: Option<String>,
    http: Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(target: &DeployTarget) -> Self {
        Self {
            endpoint: target.url().clone(),
            api_key: target.api_key().map(str::to_string),
            http: Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", key)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }
}

#[async_trait]
impl JsonRpcTransport for HttpTransport {
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<JsonRpcResponse, TransportFailure> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        debug!(endpoint = %self.endpoint, method, "Sending JSON-RPC request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .headers(self.request_headers())
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportFailure {
                code: transport_code(&e),
            })?;

        let response = response.error_for_status().map_err(|e| TransportFailure {
            code: transport_code(&e),
        })?;

        response.json().await.map_err(|e| TransportFailure {
            code: transport_code(&e),
        })
    }
}

/// Short error code in the spirit of libuv's ECONNREFUSED and friends
fn transport_code(error: &reqwest::Error) -> String {
    if let Some(status) = error.status() {
        return format!("HTTP {}", status.as_u16());
    }
    if error.is_timeout() {
        return "ETIMEDOUT".to_string();
    }
    if error.is_connect() {
        return "ECONNREFUSED".to_string();
    }
    if error.is_decode() {
        return "EBADRESPONSE".to_string();
    }
    error.to_string()
}
