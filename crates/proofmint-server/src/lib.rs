//! # proofmint-server
//!
//! HTTP surface for the Proofmint pipeline:
//!
//! - `GET /auth` redirects to Google's consent screen
//! - `GET /oauth2callback` runs the pipeline for the returned code
//! - `GET /getmetadata` returns the last metadata document built
//! - `GET /` and `GET /healthz` report liveness

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::{AppConfig, ServerConfig, StorageBackend};
pub use error::ApiError;
pub use observability::init_tracing;
pub use server::{AppState, ProofmintServer, ServerBuilder, build_app};
