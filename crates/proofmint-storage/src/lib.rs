//! # proofmint-storage
//!
//! [`ArtifactPublisher`](proofmint_core::ArtifactPublisher) backends.
//!
//! Both backends are idempotent: identical bytes always yield the same URI.

pub mod cid;
pub mod error;
pub mod http;
pub mod memory;

pub use cid::{content_id, gateway_uri, ipfs_uri};
pub use error::PublishError;
pub use http::{HttpPinningPublisher, PinningServiceConfig};
pub use memory::MemoryPublisher;
