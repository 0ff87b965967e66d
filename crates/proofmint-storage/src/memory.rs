//! In-process content-addressed store for development and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use proofmint_core::{ArtifactPublisher, PipelineError};

use crate::cid::{content_id, ipfs_uri};

/// Keeps published artifacts in memory, keyed by content id.
#[derive(Default)]
pub struct MemoryPublisher {
    objects: DashMap<String, Vec<u8>>,
}

impl MemoryPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bytes stored under `cid`.
    #[must_use]
    pub fn get(&self, cid: &str) -> Option<Vec<u8>> {
        self.objects.get(cid).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ArtifactPublisher for MemoryPublisher {
    async fn publish(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        let cid = content_id(bytes);
        self.objects
            .entry(cid.clone())
            .or_insert_with(|| bytes.to_vec());
        tracing::debug!(%cid, size = bytes.len(), "Stored artifact in memory");
        Ok(ipfs_uri(&cid))
    }
}
