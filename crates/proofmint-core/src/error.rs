//! Pipeline error taxonomy.
//!
//! Every stage of the verification pipeline fails with exactly one
//! [`PipelineError`] kind. The orchestrator never reclassifies an error it
//! receives from a collaborator; it only records which stage produced it.
//!
//! The `Display` output of each variant is the human-readable message that
//! the HTTP layer sends back to the caller, so constructors should be given
//! sentences rather than debug dumps.

use std::fmt;

use serde::Serialize;

/// Errors that terminate a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The authorization code is empty, malformed, or was rejected upstream.
    #[error("{message}")]
    Grant {
        /// Description of why the grant is unusable.
        message: String,
    },

    /// The code exchange succeeded but produced no usable access token.
    #[error("{message}")]
    Token {
        /// Description of the token problem.
        message: String,
    },

    /// The protected resource could not be fetched, even after the single
    /// permitted refresh-and-retry.
    #[error("{message}")]
    ResourceFetch {
        /// Description of the fetch failure.
        message: String,
    },

    /// The fetch succeeded but returned no resource (no linked account).
    #[error("{message}")]
    NoResource {
        /// Description of the empty result.
        message: String,
    },

    /// The proof engine returned no proof or failed to produce one.
    #[error("{message}")]
    ProofGeneration {
        /// Description of the generation failure.
        message: String,
    },

    /// The proof signature is invalid or the proof is structurally unusable.
    #[error("{message}")]
    ProofVerification {
        /// Description of the verification failure.
        message: String,
    },

    /// Verified fields do not satisfy the metadata template or the proof plan.
    #[error("{message}")]
    Schema {
        /// Description of the missing or mismatched field.
        message: String,
    },

    /// The content-addressed storage call failed.
    #[error("{message}")]
    Publish {
        /// Description of the storage failure.
        message: String,
    },

    /// Anything that does not belong to one of the classified kinds.
    #[error("{message}")]
    Internal {
        /// Description of the unexpected condition.
        message: String,
    },
}

impl PipelineError {
    /// Creates a new `Grant` error.
    #[must_use]
    pub fn grant(message: impl Into<String>) -> Self {
        Self::Grant {
            message: message.into(),
        }
    }

    /// Creates a new `Token` error.
    #[must_use]
    pub fn token(message: impl Into<String>) -> Self {
        Self::Token {
            message: message.into(),
        }
    }

    /// Creates a new `ResourceFetch` error.
    #[must_use]
    pub fn resource_fetch(message: impl Into<String>) -> Self {
        Self::ResourceFetch {
            message: message.into(),
        }
    }

    /// Creates a new `NoResource` error.
    #[must_use]
    pub fn no_resource(message: impl Into<String>) -> Self {
        Self::NoResource {
            message: message.into(),
        }
    }

    /// Creates a new `ProofGeneration` error.
    #[must_use]
    pub fn proof_generation(message: impl Into<String>) -> Self {
        Self::ProofGeneration {
            message: message.into(),
        }
    }

    /// Creates a new `ProofVerification` error.
    #[must_use]
    pub fn proof_verification(message: impl Into<String>) -> Self {
        Self::ProofVerification {
            message: message.into(),
        }
    }

    /// Creates a new `Schema` error.
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates a new `Publish` error.
    #[must_use]
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Grant { .. } => ErrorKind::Grant,
            Self::Token { .. } => ErrorKind::Token,
            Self::ResourceFetch { .. } => ErrorKind::ResourceFetch,
            Self::NoResource { .. } => ErrorKind::NoResource,
            Self::ProofGeneration { .. } => ErrorKind::ProofGeneration,
            Self::ProofVerification { .. } => ErrorKind::ProofVerification,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::Publish { .. } => ErrorKind::Publish,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the human-readable message carried by this error.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Grant { message }
            | Self::Token { message }
            | Self::ResourceFetch { message }
            | Self::NoResource { message }
            | Self::ProofGeneration { message }
            | Self::ProofVerification { message }
            | Self::Schema { message }
            | Self::Publish { message }
            | Self::Internal { message } => message,
        }
    }

    /// Returns `true` if this error is attributable to the caller's grant,
    /// account, or proof rather than to this service (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.kind().is_client_error()
    }
}

/// Classification of a [`PipelineError`], used for logging and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Bad or empty authorization code.
    Grant,
    /// Exchange succeeded but no usable token.
    Token,
    /// Fetch failed after the single permitted refresh retry.
    ResourceFetch,
    /// Zero results.
    NoResource,
    /// Engine returned no proof.
    ProofGeneration,
    /// Signature invalid.
    ProofVerification,
    /// Verified fields don't satisfy the metadata template.
    Schema,
    /// Storage call failed.
    Publish,
    /// Unclassified.
    Internal,
}

impl ErrorKind {
    /// Returns `true` for kinds that map to a 4xx response.
    #[must_use]
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::Grant
                | Self::Token
                | Self::ResourceFetch
                | Self::NoResource
                | Self::ProofGeneration
                | Self::ProofVerification
                | Self::Schema
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grant => write!(f, "GrantError"),
            Self::Token => write!(f, "TokenError"),
            Self::ResourceFetch => write!(f, "ResourceFetchError"),
            Self::NoResource => write!(f, "NoResourceError"),
            Self::ProofGeneration => write!(f, "ProofGenerationError"),
            Self::ProofVerification => write!(f, "ProofVerificationError"),
            Self::Schema => write!(f, "SchemaError"),
            Self::Publish => write!(f, "PublishError"),
            Self::Internal => write!(f, "InternalError"),
        }
    }
}
