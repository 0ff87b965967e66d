//! # proofmint-auth
//!
//! Identity-provider side of the Proofmint pipeline.
//!
//! ## Modules
//!
//! - [`config`] - Google OAuth client configuration
//! - [`consent`] - consent redirect URL and single-use `state` ledger
//! - [`client`] - token exchange and refresh against the token endpoint
//! - [`youtube`] - YouTube channel lookup
//! - [`store`] - keyed in-memory token store with TTL
//! - [`error`] - client error types

pub mod client;
pub mod config;
pub mod consent;
pub mod error;
pub mod store;
pub mod youtube;

pub use client::GoogleOAuthClient;
pub use config::{
    GOOGLE_AUTH_ENDPOINT, GOOGLE_TOKEN_ENDPOINT, GoogleOAuthConfig, YOUTUBE_READONLY_SCOPE,
};
pub use consent::{
    DEFAULT_CONSENT_TTL, DEFAULT_MAX_PENDING_CONSENTS, PendingConsents, authorization_url,
    generate_state,
};
pub use error::{MISSING_ACCESS_TOKEN_MESSAGE, OAuthClientError};
pub use store::{MemoryTokenStore, TokenStoreStats, spawn_purge_task};
pub use youtube::{YOUTUBE_API_BASE, YoutubeChannelApi};
