//! REST transport.
//!
//! The engine talks to entity services through [`HttpClient`], so any async
//! client can stand in. [`ReqwestHttpClient`] is the default.

use crate::error::{RemoteError, RemoteResult, TransportError};
use async_trait::async_trait;
use remodel_model::HttpMethod;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// A request to an entity service.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: HttpMethod,
    pub url: String,
    /// JSON payload for POST and PUT.
    pub body: Option<Value>,
}

impl RestRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            body: Some(body),
        }
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Put,
            url: url.into(),
            body: Some(body),
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Delete,
            url: url.into(),
            body: None,
        }
    }
}

/// A successful response. The body is `Null` when the service sent none,
/// sent something other than JSON, or answered a DELETE.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: Value,
}

/// Async HTTP client used for every entity-service call.
///
/// Implementations return [`TransportError::Status`] for non-success statuses
/// so callers can read the error payload.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: RestRequest) -> Result<RestResponse, TransportError>;
}

/// Configuration for the reqwest-backed client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: concat!("remodel/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// [`HttpClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new(config: &HttpConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RemoteError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: RestRequest) -> Result<RestResponse, TransportError> {
        let RestRequest { method, url, body } = request;
        debug!(%method, %url, "Sending entity service request");

        let builder = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        let builder = match &body {
            Some(payload) => builder.json(payload),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| TransportError::Network {
            method,
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| TransportError::Network {
            method,
            url: url.clone(),
            reason: format!("failed to read body: {e}"),
        })?;

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            debug!(%method, %url, status = status.as_u16(), "Entity service returned error status");
            return Err(TransportError::Status {
                method,
                url,
                status: status.as_u16(),
                body,
            });
        }

        // DELETE bodies are never read; other verbs treat a body that is not
        // JSON as carrying no rows.
        let body = if bytes.is_empty() || method == HttpMethod::Delete {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(%method, %url, "Ignoring response body that is not JSON: {e}");
                Value::Null
            })
        };

        Ok(RestResponse {
            status: status.as_u16(),
            body,
        })
    }
}
