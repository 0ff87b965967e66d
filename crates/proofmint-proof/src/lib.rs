//! # proofmint-proof
//!
//! Adapters for the external zero-knowledge proof service.
//!
//! - [`ReclaimProofEngine`] asks the service to re-perform an authenticated
//!   request and prove its response matched a set of regex patterns.
//! - [`ReclaimProofVerifier`] has the service check witness signatures, then
//!   parses the proof into a [`VerifiedClaim`](proofmint_core::VerifiedClaim)
//!   locally.

pub mod claim;
pub mod config;
pub mod engine;
pub mod error;
pub mod verifier;

pub use claim::{parse_claim, signatures};
pub use config::ProofServiceConfig;
pub use engine::ReclaimProofEngine;
pub use error::ProofServiceError;
pub use verifier::ReclaimProofVerifier;
