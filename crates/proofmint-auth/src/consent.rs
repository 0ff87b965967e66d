//! Consent redirect construction and the pending-consent ledger.
//!
//! `GET /auth` issues a random `state` value and records it here; the
//! callback consumes it exactly once and uses it as the token-store key for
//! the session.

use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use rand::RngCore;
use url::Url;

use crate::config::GoogleOAuthConfig;
use crate::error::OAuthClientError;

/// Default lifetime of an issued consent state.
pub const DEFAULT_CONSENT_TTL: Duration = Duration::from_secs(600);

/// Default upper bound on outstanding consent states.
pub const DEFAULT_MAX_PENDING_CONSENTS: usize = 10_000;

/// Generates a URL-safe random state value (256 bits).
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Builds the consent-screen URL.
///
/// Requests offline access and forces the consent prompt so that Google
/// returns a refresh token on every grant.
///
/// # Errors
///
/// Returns an error if the configured auth endpoint is not a valid URL.
pub fn authorization_url(config: &GoogleOAuthConfig, state: &str) -> Result<Url, OAuthClientError> {
    let mut url = Url::parse(&config.auth_endpoint)?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &config.scope)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("state", state);
    Ok(url)
}

/// Single-use ledger of issued consent states.
///
/// Holds at most `max_pending` states; when full, expired states are purged
/// first and then the state closest to expiry is dropped.
pub struct PendingConsents {
    pending: DashMap<String, Instant>,
    ttl: Duration,
    max_pending: usize,
}

impl PendingConsents {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_PENDING_CONSENTS)
    }

    #[must_use]
    pub fn with_capacity(ttl: Duration, max_pending: usize) -> Self {
        Self {
            pending: DashMap::new(),
            ttl,
            max_pending: max_pending.max(1),
        }
    }

    /// Issues and records a fresh state value.
    pub fn issue(&self) -> String {
        if self.pending.len() >= self.max_pending {
            self.purge_expired();
            while self.pending.len() >= self.max_pending && self.evict_oldest() {}
        }
        let state = generate_state();
        self.pending
            .insert(state.clone(), Instant::now() + self.ttl);
        state
    }

    /// Consumes a state. Returns `true` only for a live, previously issued
    /// state; a second call with the same value returns `false`.
    pub fn consume(&self, state: &str) -> bool {
        self.pending
            .remove(state)
            .is_some_and(|(_, expires_at)| expires_at > Instant::now())
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .pending
            .iter()
            .min_by_key(|entry| *entry.value())
            .map(|entry| entry.key().clone());
        match oldest {
            Some(state) => {
                self.pending.remove(&state);
                tracing::debug!("Consent ledger full, dropped oldest state");
                true
            }
            None => false,
        }
    }

    /// Removes expired states, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.pending.len();
        self.pending.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.pending.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for PendingConsents {
    fn default() -> Self {
        Self::new(DEFAULT_CONSENT_TTL)
    }
}
