//! Authorization grant.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::PipelineError;

/// Message returned when the callback carries no code at all.
pub const MISSING_CODE_MESSAGE: &str = "No authorization code provided.";

/// A single-use authorization code issued by the identity provider.
///
/// The type is deliberately not `Clone`: a grant is moved into the token
/// exchanger and cannot be presented a second time.
pub struct AuthorizationGrant {
    code: String,
}

impl AuthorizationGrant {
    /// Upper bound on accepted code length.
    pub const MAX_LEN: usize = 2048;

    /// Validates a raw authorization code.
    ///
    /// # Errors
    ///
    /// Returns a `Grant` error if the code is empty, longer than
    /// [`Self::MAX_LEN`], or contains whitespace or control characters.
    pub fn parse(code: impl Into<String>) -> Result<Self, PipelineError> {
        let code = code.into();

        if code.is_empty() {
            return Err(PipelineError::grant(MISSING_CODE_MESSAGE));
        }
        if code.len() > Self::MAX_LEN {
            return Err(PipelineError::grant(format!(
                "Malformed authorization code: longer than {} bytes.",
                Self::MAX_LEN
            )));
        }
        if code.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(PipelineError::grant(
                "Malformed authorization code: contains whitespace or control characters.",
            ));
        }

        Ok(Self { code })
    }

    /// Returns the raw code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Returns a stable, non-reversible key derived from the code.
    ///
    /// Used to scope token storage to a run when the caller supplies no
    /// session key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.code.as_bytes());
        format!("grant:{}", hex::encode(&digest[..16]))
    }
}

impl fmt::Debug for AuthorizationGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationGrant")
            .field("code", &"[REDACTED]")
            .finish()
    }
}
