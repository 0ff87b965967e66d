//! Pinning-service publisher.
//!
//! Uploads the raw bytes with a bearer credential and reads the content id
//! from the response. Accepts the common response shapes:
//! `{"cid": ..}`, `{"value": {"cid": ..}}` and `{"IpfsHash": ..}`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use proofmint_core::{ArtifactPublisher, PipelineError};
use serde_json::Value;

use crate::cid::{content_id, gateway_uri, ipfs_uri};
use crate::error::PublishError;

/// Upload endpoint and credential for a pinning service.
#[derive(Clone)]
pub struct PinningServiceConfig {
    /// Upload URL (POST).
    pub upload_url: String,

    /// Bearer credential.
    pub api_key: String,

    /// HTTP gateway used to build retrieval URIs. `ipfs://` URIs when unset.
    pub gateway: Option<String>,

    /// HTTP request timeout (default: 60 seconds).
    pub request_timeout: Duration,

    /// Most content ids whose URI is remembered (default: 1024).
    pub cache_limit: usize,
}

impl PinningServiceConfig {
    #[must_use]
    pub fn new(upload_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            api_key: api_key.into(),
            gateway: None,
            request_timeout: Duration::from_secs(60),
            cache_limit: 1024,
        }
    }

    /// Returns gateway URIs instead of `ipfs://` URIs.
    #[must_use]
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = Some(gateway.into());
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Bounds the URI cache. Zero disables it.
    #[must_use]
    pub fn with_cache_limit(mut self, limit: usize) -> Self {
        self.cache_limit = limit;
        self
    }
}

impl fmt::Debug for PinningServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinningServiceConfig")
            .field("upload_url", &self.upload_url)
            .field("api_key", &"[REDACTED]")
            .field("gateway", &self.gateway)
            .field("request_timeout", &self.request_timeout)
            .field("cache_limit", &self.cache_limit)
            .finish()
    }
}

/// [`ArtifactPublisher`] backed by an HTTP pinning service.
///
/// Remembers the URI returned for each local content id, so publishing the
/// same bytes again returns the same URI without another upload. Once the
/// cache holds `cache_limit` ids, an arbitrary entry makes room; an evicted
/// artifact is simply uploaded again.
pub struct HttpPinningPublisher {
    http_client: reqwest::Client,
    config: PinningServiceConfig,
    published: DashMap<String, String>,
}

impl HttpPinningPublisher {
    /// Creates a publisher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: PinningServiceConfig) -> Result<Self, PublishError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http_client,
            config,
            published: DashMap::new(),
        })
    }

    /// Uploads the bytes and returns the service's content id.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails or the response has no cid.
    pub async fn upload(&self, bytes: &[u8]) -> Result<String, PublishError> {
        let response = self
            .http_client
            .post(self.config.upload_url.as_str())
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::Http {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        extract_cid(&body).ok_or(PublishError::MissingCid)
    }

    fn remember(&self, local_cid: String, uri: &str) {
        if self.config.cache_limit == 0 {
            return;
        }
        while self.published.len() >= self.config.cache_limit {
            let victim = self.published.iter().next().map(|entry| entry.key().clone());
            match victim {
                Some(key) => {
                    self.published.remove(&key);
                }
                None => break,
            }
        }
        self.published.insert(local_cid, uri.to_string());
    }

    fn uri_for(&self, cid: &str) -> String {
        match &self.config.gateway {
            Some(gateway) => gateway_uri(gateway, cid),
            None => ipfs_uri(cid),
        }
    }
}

fn extract_cid(body: &Value) -> Option<String> {
    [
        body.get("cid"),
        body.pointer("/value/cid"),
        body.get("IpfsHash"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|cid| !cid.is_empty())
    .map(str::to_string)
}

#[async_trait]
impl ArtifactPublisher for HttpPinningPublisher {
    async fn publish(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        let local_cid = content_id(bytes);
        if let Some(uri) = self.published.get(&local_cid) {
            return Ok(uri.value().clone());
        }

        let cid = self.upload(bytes).await.map_err(|e| {
            tracing::warn!(error = %e, "Metadata upload failed");
            PipelineError::from(e)
        })?;
        let uri = self.uri_for(&cid);
        tracing::info!(%cid, size = bytes.len(), "Metadata uploaded");

        self.remember(local_cid, &uri);
        Ok(uri)
    }
}
