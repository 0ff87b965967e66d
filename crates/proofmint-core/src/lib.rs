//! # proofmint-core
//!
//! Verification pipeline for Proofmint.
//!
//! An OAuth authorization grant goes in; a published, content-addressed NFT
//! metadata document backed by a verified zero-knowledge claim comes out:
//!
//! ```text
//! grant → tokens → snapshot → proof → verified claim → metadata → artifact
//! ```
//!
//! This crate owns the data model, the error taxonomy and the sequencing
//! rules. Every external system is reached through a trait in [`traits`];
//! HTTP adapters for them live in the sibling crates.
//!
//! ## Modules
//!
//! - [`types`] - grants, tokens, snapshots, proofs, claims, metadata
//! - [`error`] - the [`PipelineError`] taxonomy
//! - [`traits`] - collaborator contracts
//! - [`fetcher`] - resource fetch with one refresh-and-retry
//! - [`plan`] - proof request construction
//! - [`metadata`] - metadata templates and the pure builder
//! - [`pipeline`] - state machine and orchestrator

pub mod error;
pub mod fetcher;
pub mod metadata;
pub mod pipeline;
pub mod plan;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, PipelineError};
pub use fetcher::{NO_RESOURCE_MESSAGE, ResourceFetcher};
pub use metadata::{
    AttributeSpec, MetadataBuilder, MetadataTemplate, TemplatePreset, TextSpec, ValueSource,
};
pub use pipeline::{
    Collaborators, PipelineFailure, PipelineOrchestrator, PipelineOutcome, PipelineState,
    RunRequest, Stage, StageTimeouts,
};
pub use plan::{ProofPlan, YOUTUBE_API_BASE};
pub use traits::{
    ArtifactPublisher, FetchFailure, ProofEngine, ProofVerifier, ResourceApi, TokenExchanger,
    TokenRefresher, TokenStore,
};
pub use types::{
    AuthorizationGrant, FieldPattern, HttpMethod, MetadataAttribute, NftMetadata, Proof,
    ProofRequestSpec, PublishedArtifact, ResourceSnapshot, ResourceStatistics, SnapshotField,
    TokenSet, VerifiedClaim,
};

/// Type alias for pipeline results.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use proofmint_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::PipelineResult;
    pub use crate::error::{ErrorKind, PipelineError};
    pub use crate::traits::{
        ArtifactPublisher, FetchFailure, ProofEngine, ProofVerifier, ResourceApi, TokenExchanger,
        TokenRefresher, TokenStore,
    };
    pub use crate::types::{
        AuthorizationGrant, Proof, ProofRequestSpec, ResourceSnapshot, TokenSet, VerifiedClaim,
    };
}
