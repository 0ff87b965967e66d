//! Proof generation through the proof service's zkFetch endpoint.
//!
//! The service re-performs the request itself, inside its own attested
//! execution context, using the headers we hand it. It never sees a copy of
//! the response from us.

use std::collections::BTreeMap;

use async_trait::async_trait;
use proofmint_core::{HttpMethod, PipelineError, Proof, ProofEngine, ProofRequestSpec};
use serde::{Deserialize, Serialize};

use crate::config::ProofServiceConfig;
use crate::error::ProofServiceError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZkFetchRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
    url: &'a str,
    public_options: PublicOptions,
    private_options: PrivateOptions<'a>,
}

#[derive(Debug, Serialize)]
struct PublicOptions {
    method: HttpMethod,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrivateOptions<'a> {
    headers: &'a BTreeMap<String, String>,
    response_matches: Vec<ResponseMatch<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseMatch<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct ZkFetchResponse {
    #[serde(default)]
    proof: Option<serde_json::Value>,
}

/// [`ProofEngine`] backed by the proof service's `/zkfetch` endpoint.
#[derive(Clone)]
pub struct ReclaimProofEngine {
    http_client: reqwest::Client,
    config: ProofServiceConfig,
}

impl ReclaimProofEngine {
    /// Creates an engine with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ProofServiceConfig) -> Result<Self, ProofServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_http_client(config, http_client))
    }

    #[must_use]
    pub fn with_http_client(config: ProofServiceConfig, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Asks the service to fetch `spec.url` and prove the response matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the service call fails or its answer is unreadable.
    pub async fn zk_fetch(&self, spec: &ProofRequestSpec) -> Result<Option<Proof>, ProofServiceError> {
        let body = ZkFetchRequest {
            app_id: &self.config.app_id,
            app_secret: &self.config.app_secret,
            url: &spec.url,
            public_options: PublicOptions {
                method: spec.method,
            },
            private_options: PrivateOptions {
                headers: &spec.headers,
                response_matches: spec
                    .patterns
                    .iter()
                    .map(|p| ResponseMatch {
                        kind: "regex",
                        value: p.rule(),
                    })
                    .collect(),
            },
        };

        tracing::debug!(
            url = %spec.url,
            patterns = spec.patterns.len(),
            "Requesting zkFetch proof"
        );

        let response = self
            .http_client
            .post(self.config.url("zkfetch"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProofServiceError::Http {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: ZkFetchResponse = response
            .json()
            .await
            .map_err(|e| ProofServiceError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .proof
            .filter(|p| !p.is_null())
            .map(Proof::from_value))
    }
}

#[async_trait]
impl ProofEngine for ReclaimProofEngine {
    async fn generate_proof(&self, spec: &ProofRequestSpec) -> Result<Option<Proof>, PipelineError> {
        self.zk_fetch(spec).await.map_err(|e| {
            tracing::warn!(error = %e, "Proof generation failed");
            PipelineError::proof_generation(format!("Failed to generate proof. {e}"))
        })
    }
}
