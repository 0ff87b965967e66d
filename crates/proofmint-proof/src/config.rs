//! Proof service configuration.

use std::fmt;
use std::time::Duration;

/// Endpoint and application credentials for the proof service.
#[derive(Clone)]
pub struct ProofServiceConfig {
    /// Base URL of the proof service.
    pub endpoint: String,

    /// Application id registered with the proof network.
    pub app_id: String,

    /// Application secret.
    pub app_secret: String,

    /// HTTP request timeout (default: 120 seconds; proof generation is slow).
    pub request_timeout: Duration,
}

impl ProofServiceConfig {
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for ProofServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofServiceConfig")
            .field("endpoint", &self.endpoint)
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
