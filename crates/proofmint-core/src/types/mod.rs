//! Pipeline data model.
//!
//! Values flow strictly forward:
//! grant → tokens → snapshot → proof → verified claim → metadata → artifact.

pub mod grant;
pub mod metadata;
pub mod proof;
pub mod snapshot;
pub mod token;

pub use grant::{AuthorizationGrant, MISSING_CODE_MESSAGE};
pub use metadata::{MetadataAttribute, NftMetadata, PublishedArtifact};
pub use proof::{FieldPattern, HttpMethod, Proof, ProofRequestSpec, VerifiedClaim};
pub use snapshot::{ResourceSnapshot, ResourceStatistics, SnapshotField};
pub use token::TokenSet;
