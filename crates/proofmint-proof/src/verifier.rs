//! Proof verification through the proof service's `/verify` endpoint.

use async_trait::async_trait;
use proofmint_core::{PipelineError, Proof, ProofVerifier, VerifiedClaim};
use serde::{Deserialize, Serialize};

use crate::claim::{parse_claim, signatures};
use crate::config::ProofServiceConfig;
use crate::error::ProofServiceError;

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    proof: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    valid: bool,
}

/// [`ProofVerifier`] that checks signatures remotely and parses claims locally.
#[derive(Clone)]
pub struct ReclaimProofVerifier {
    http_client: reqwest::Client,
    config: ProofServiceConfig,
}

impl ReclaimProofVerifier {
    /// Creates a verifier with its own HTTP client.
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

    /// Checks the proof's witness signatures.
    ///
    /// A proof without signatures is rejected locally without a service call.
    ///
    /// # Errors
    ///
    /// Returns an error if the service call fails or its answer is unreadable.
    pub async fn verify_signed_proof(&self, proof: &Proof) -> Result<bool, ProofServiceError> {
        if signatures(proof).is_empty() {
            tracing::debug!("Proof carries no signatures");
            return Ok(false);
        }

        let response = self
            .http_client
            .post(self.config.url("verify"))
            .json(&VerifyRequest {
                proof: proof.as_value(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProofServiceError::Http {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let verdict: VerifyResponse = response
            .json()
            .await
            .map_err(|e| ProofServiceError::InvalidResponse(e.to_string()))?;

        Ok(verdict.valid)
    }
}

#[async_trait]
impl ProofVerifier for ReclaimProofVerifier {
    async fn verify(&self, proof: &Proof) -> Result<bool, PipelineError> {
        self.verify_signed_proof(proof).await.map_err(|e| {
            tracing::warn!(error = %e, "Proof verification call failed");
            PipelineError::proof_verification(format!("Proof could not be verified: {e}"))
        })
    }

    fn transform(&self, proof: &Proof) -> Result<VerifiedClaim, PipelineError> {
        parse_claim(proof).map_err(|e| PipelineError::proof_verification(e.to_string()))
    }
}
