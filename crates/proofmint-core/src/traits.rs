//! Collaborator contracts.
//!
//! The orchestrator drives every external system through one of these
//! traits. Implementations live in separate crates:
//!
//! - `proofmint-auth` - token exchange/refresh, resource API, token store
//! - `proofmint-proof` - proof engine and verifier adapters
//! - `proofmint-storage` - artifact publishers
//!
//! Each method returns exactly one [`PipelineError`] kind on failure; the
//! kind is documented per method.

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::types::{
    AuthorizationGrant, Proof, ProofRequestSpec, ResourceSnapshot, TokenSet, VerifiedClaim,
};

/// Turns an authorization grant into a token set.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Exchanges the grant. Must not retry: the code is single-use.
    ///
    /// # Errors
    ///
    /// - `Grant` if the code is rejected or the exchange call fails
    /// - `Token` if the exchange succeeds without an access token
    async fn exchange(&self, grant: AuthorizationGrant) -> Result<TokenSet, PipelineError>;
}

/// Mints a new access token from a refresh token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Performs one refresh call.
    ///
    /// # Errors
    ///
    /// Returns a `Token` error if the refresh is rejected or yields no token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, PipelineError>;
}

/// Failure modes of a single protected-resource call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// The access token was rejected (expired or invalid).
    #[error("authorization rejected: {0}")]
    Unauthorized(String),

    /// The call succeeded but returned zero results.
    #[error("no resource found")]
    NoResource,

    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

/// Single-shot access to the protected resource.
///
/// The refresh-and-retry policy lives in
/// [`ResourceFetcher`](crate::fetcher::ResourceFetcher), not here.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Fetches the resource once with the given access token.
    async fn fetch_snapshot(&self, access_token: &str) -> Result<ResourceSnapshot, FetchFailure>;
}

/// Produces a signed proof that a live response matched given patterns.
#[async_trait]
pub trait ProofEngine: Send + Sync {
    /// Generates a proof. `Ok(None)` means the engine produced no proof.
    ///
    /// # Errors
    ///
    /// Returns a `ProofGeneration` error if the engine call fails.
    async fn generate_proof(&self, spec: &ProofRequestSpec) -> Result<Option<Proof>, PipelineError>;
}

/// Checks proof signatures and turns proofs into structured claims.
///
/// Callers must invoke [`verify`](Self::verify) first and only call
/// [`transform`](Self::transform) on a proof that verified.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Validates the proof's signatures.
    ///
    /// # Errors
    ///
    /// Returns a `ProofVerification` error if the verifier cannot be reached.
    async fn verify(&self, proof: &Proof) -> Result<bool, PipelineError>;

    /// Parses a verified proof into a claim. Deterministic for a given proof.
    ///
    /// # Errors
    ///
    /// Returns a `ProofVerification` error for a structurally unusable proof.
    fn transform(&self, proof: &Proof) -> Result<VerifiedClaim, PipelineError>;
}

/// Persists bytes to content-addressed storage.
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Publishes the bytes and returns a retrieval URI.
    ///
    /// Identical bytes always yield the same URI, so repeated calls are safe.
    ///
    /// # Errors
    ///
    /// Returns a `Publish` error if the storage call fails.
    async fn publish(&self, bytes: &[u8]) -> Result<String, PipelineError>;
}

/// Keyed storage for token sets.
///
/// Keys are per session or per identity; there is no process-wide slot.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Stores (or replaces) the token set under `key`.
    async fn put(&self, key: &str, tokens: TokenSet);

    /// Returns the live token set under `key`, if any.
    async fn get(&self, key: &str) -> Option<TokenSet>;

    /// Removes and returns the token set under `key`.
    async fn remove(&self, key: &str) -> Option<TokenSet>;

    /// Removes expired entries, returning how many were dropped.
    ///
    /// Default implementation is a no-op for stores with native expiry.
    fn purge_expired(&self) -> usize {
        0
    }
}
