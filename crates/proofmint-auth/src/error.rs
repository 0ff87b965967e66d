//! Error types for the Google OAuth and YouTube clients.

use proofmint_core::PipelineError;

/// Message returned when a token response carries no access token.
pub const MISSING_ACCESS_TOKEN_MESSAGE: &str = "Failed to obtain access token.";

/// Errors from the OAuth token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum OAuthClientError {
    /// The provider returned an OAuth error body.
    #[error("OAuth error from provider: {error} - {description}")]
    OAuth {
        /// The OAuth error code.
        error: String,
        /// Optional error description.
        description: String,
    },

    /// The provider returned a non-success status without an OAuth body.
    #[error("HTTP {status} - {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response succeeded but had no access token.
    #[error("Failed to obtain access token.")]
    MissingAccessToken,

    /// The response body could not be parsed.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to parse a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl OAuthClientError {
    /// Creates an `OAuth` error from a provider response.
    #[must_use]
    pub fn oauth(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }

    /// Maps an authorization-code exchange failure into the pipeline taxonomy.
    ///
    /// A missing access token is a `Token` error; everything else means the
    /// grant could not be redeemed.
    #[must_use]
    pub fn into_exchange_error(self) -> PipelineError {
        match self {
            Self::MissingAccessToken => PipelineError::token(MISSING_ACCESS_TOKEN_MESSAGE),
            other => PipelineError::grant(format!("{MISSING_ACCESS_TOKEN_MESSAGE} {other}")),
        }
    }

    /// Maps a refresh failure into the pipeline taxonomy.
    #[must_use]
    pub fn into_refresh_error(self) -> PipelineError {
        PipelineError::token(format!("Failed to refresh access token: {self}"))
    }
}
