//! Google OAuth client configuration.

use std::fmt;
use std::time::Duration;

/// Google's authorization (consent) endpoint.
pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google's token endpoint.
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Read-only YouTube scope.
pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Credentials and endpoints for the Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Redirect URI registered for the client.
    pub redirect_uri: String,

    /// Consent screen endpoint.
    pub auth_endpoint: String,

    /// Token endpoint for code exchange and refresh.
    pub token_endpoint: String,

    /// Requested scope.
    pub scope: String,

    /// HTTP request timeout (default: 10 seconds).
    pub request_timeout: Duration,
}

impl GoogleOAuthConfig {
    /// Creates a configuration against Google's production endpoints.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            auth_endpoint: GOOGLE_AUTH_ENDPOINT.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            scope: YOUTUBE_READONLY_SCOPE.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Overrides the consent endpoint.
    #[must_use]
    pub fn with_auth_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.auth_endpoint = endpoint.into();
        self
    }

    /// Overrides the token endpoint.
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Overrides the requested scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_endpoint", &self.auth_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("scope", &self.scope)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
