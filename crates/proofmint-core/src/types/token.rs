//! OAuth token sets.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Access/refresh token pair returned by the identity provider.
///
/// A `TokenSet` belongs to a single run (or a single identity when stored
/// under an identity key). It is never shared across unrelated requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Short-lived bearer token for the protected resource.
    pub access_token: String,

    /// Long-lived token used to mint a new access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type, normally `Bearer`.
    pub token_type: String,

    /// Scopes granted by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Absolute expiry of the access token, if the provider reported one.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<OffsetDateTime>,
}

impl TokenSet {
    /// Creates a bearer token set with only an access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            scope: None,
            expires_at: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the expiry relative to now.
    #[must_use]
    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        self.expires_at = OffsetDateTime::now_utc().checked_add(Duration::seconds(seconds));
        self
    }

    /// Sets the granted scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Returns `true` if a refresh token is available.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Folds a refresh response into this set.
    ///
    /// Providers usually omit the refresh token from a refresh response, in
    /// which case the existing one is kept.
    pub fn absorb_refresh(&mut self, refreshed: TokenSet) {
        self.access_token = refreshed.access_token;
        self.token_type = refreshed.token_type;
        self.expires_at = refreshed.expires_at;
        if refreshed.scope.is_some() {
            self.scope = refreshed.scope;
        }
        if refreshed.refresh_token.is_some() {
            self.refresh_token = refreshed.refresh_token;
        }
    }

    /// Returns the value for an `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
