//! Publish errors.

use proofmint_core::PipelineError;

/// Errors from a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The storage service returned a non-success status.
    #[error("storage service returned HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The storage service answered without a content identifier.
    #[error("storage response has no content identifier")]
    MissingCid,

    /// The response body could not be decoded.
    #[error("invalid storage response: {0}")]
    InvalidResponse(String),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<PublishError> for PipelineError {
    fn from(err: PublishError) -> Self {
        PipelineError::publish(format!("Failed to upload metadata: {err}"))
    }
}
