//! NFT metadata documents and published artifacts.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Immutable metadata document referencing a verified ownership claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<MetadataAttribute>,
}

impl NftMetadata {
    /// Serializes the document to its canonical byte form.
    ///
    /// Field order follows the struct declaration and attributes keep their
    /// template order, so equal documents always produce equal bytes.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        serde_json::to_vec(self)
            .map_err(|e| PipelineError::internal(format!("failed to serialize metadata: {e}")))
    }

    /// Looks up an attribute by trait type.
    #[must_use]
    pub fn attribute(&self, trait_type: &str) -> Option<&MetadataAttribute> {
        self.attributes.iter().find(|a| a.trait_type == trait_type)
    }
}

/// A single `(trait_type, value)` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: String,

    /// `true` when the value came from the verified claim, `false` when it
    /// was copied from the resource snapshot without proof coverage.
    pub verified: bool,
}

/// A metadata document persisted to content-addressed storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifact {
    /// Retrieval URI returned by the publisher.
    pub uri: String,

    /// The exact bytes that produced `uri`.
    pub bytes: Vec<u8>,
}
