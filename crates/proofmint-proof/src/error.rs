//! Error types for the proof service adapters.

/// Errors from the proof service or from parsing its proofs.
#[derive(Debug, thiserror::Error)]
pub enum ProofServiceError {
    /// The service returned a non-success status.
    #[error("proof service returned HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The service response could not be decoded.
    #[error("invalid proof service response: {0}")]
    InvalidResponse(String),

    /// The proof document lacks a required part.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProofServiceError {
    /// Creates a `MalformedProof` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedProof(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ProofServiceError::Http {
                status: 503,
                body: "busy".into()
            }
            .to_string(),
            "proof service returned HTTP 503: busy"
        );
        assert_eq!(
            ProofServiceError::malformed("no context").to_string(),
            "malformed proof: no context"
        );
    }
}
