//! Metadata templates and the pure metadata builder.
//!
//! A [`MetadataTemplate`] declares where every piece of the document comes
//! from: a named field of the [`VerifiedClaim`], the claim identifier, or a
//! field of the [`ResourceSnapshot`]. [`MetadataBuilder::build`] resolves
//! those sources and performs no I/O, so identical inputs always produce
//! byte-identical documents.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::types::{
    MetadataAttribute, NftMetadata, ResourceSnapshot, SnapshotField, VerifiedClaim,
};

/// Where a template value is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// A field extracted by the proof engine. Verified.
    Claim(String),

    /// The identifier assigned to the claim. Verified.
    ClaimIdentifier,

    /// A field of the resource snapshot. Descriptive only, not proof-covered.
    Snapshot(SnapshotField),
}

impl ValueSource {
    /// Returns `true` if values from this source are covered by the proof.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        !matches!(self, Self::Snapshot(_))
    }

    fn resolve(
        &self,
        claim: &VerifiedClaim,
        snapshot: &ResourceSnapshot,
    ) -> Option<String> {
        match self {
            Self::Claim(name) => claim
                .field(name)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            Self::ClaimIdentifier => {
                Some(claim.identifier.clone()).filter(|v| !v.is_empty())
            }
            Self::Snapshot(field) => snapshot.field(*field),
        }
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claim(name) => write!(f, "claim field `{name}`"),
            Self::ClaimIdentifier => f.write_str("claim identifier"),
            Self::Snapshot(field) => write!(f, "snapshot field `{field}`"),
        }
    }
}

/// Text assembled from a literal prefix, an optional source value and a
/// literal suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpec {
    prefix: String,
    source: Option<ValueSource>,
    suffix: String,
}

impl TextSpec {
    /// Fixed text.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            prefix: text.into(),
            source: None,
            suffix: String::new(),
        }
    }

    /// `prefix` followed by the source value.
    #[must_use]
    pub fn prefixed(prefix: impl Into<String>, source: ValueSource) -> Self {
        Self {
            prefix: prefix.into(),
            source: Some(source),
            suffix: String::new(),
        }
    }

    /// The source value followed by `suffix`.
    #[must_use]
    pub fn suffixed(source: ValueSource, suffix: impl Into<String>) -> Self {
        Self {
            prefix: String::new(),
            source: Some(source),
            suffix: suffix.into(),
        }
    }

    fn render(
        &self,
        part: &str,
        claim: &VerifiedClaim,
        snapshot: &ResourceSnapshot,
    ) -> Result<String, PipelineError> {
        let Some(source) = &self.source else {
            return Ok(self.prefix.clone());
        };
        let value = source
            .resolve(claim, snapshot)
            .ok_or_else(|| missing(part, source))?;
        Ok(format!("{}{}{}", self.prefix, value, self.suffix))
    }
}

/// One attribute line of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    trait_type: String,
    source: ValueSource,
    optional: bool,
}

impl AttributeSpec {
    /// A required attribute.
    #[must_use]
    pub fn required(trait_type: impl Into<String>, source: ValueSource) -> Self {
        Self {
            trait_type: trait_type.into(),
            source,
            optional: false,
        }
    }

    /// An attribute that is omitted when its source value is absent.
    #[must_use]
    pub fn optional(trait_type: impl Into<String>, source: ValueSource) -> Self {
        Self {
            trait_type: trait_type.into(),
            source,
            optional: true,
        }
    }

    #[must_use]
    pub fn trait_type(&self) -> &str {
        &self.trait_type
    }

    #[must_use]
    pub fn source(&self) -> &ValueSource {
        &self.source
    }
}

/// Named template presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplatePreset {
    /// `YouTube Ownership NFT` with channel name, data id, image and proof.
    #[default]
    Ownership,

    /// `<title> YouTube Ownership NFT` with channel, id, subscribers and proof.
    Titled,
}

impl TemplatePreset {
    /// Builds the template for this preset.
    #[must_use]
    pub fn template(self) -> MetadataTemplate {
        match self {
            Self::Ownership => MetadataTemplate::ownership(),
            Self::Titled => MetadataTemplate::titled(),
        }
    }
}

impl fmt::Display for TemplatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ownership => f.write_str("ownership"),
            Self::Titled => f.write_str("titled"),
        }
    }
}

impl FromStr for TemplatePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ownership" => Ok(Self::Ownership),
            "titled" => Ok(Self::Titled),
            other => Err(format!("unknown metadata template `{other}`")),
        }
    }
}

/// Declarative shape of an NFT metadata document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTemplate {
    name: TextSpec,
    description: TextSpec,
    image: ValueSource,
    attributes: Vec<AttributeSpec>,
}

impl MetadataTemplate {
    #[must_use]
    pub fn new(name: TextSpec, description: TextSpec, image: ValueSource) -> Self {
        Self {
            name,
            description,
            image,
            attributes: Vec::new(),
        }
    }

    /// Appends an attribute. Attributes keep insertion order.
    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// The `ownership` preset.
    #[must_use]
    pub fn ownership() -> Self {
        Self::new(
            TextSpec::literal("YouTube Ownership NFT"),
            TextSpec::prefixed(
                "Proof of Owner for YouTube account: ",
                ValueSource::Claim("title".into()),
            ),
            ValueSource::Snapshot(SnapshotField::Image),
        )
        .with_attribute(AttributeSpec::required(
            "Channel Name",
            ValueSource::Claim("title".into()),
        ))
        .with_attribute(AttributeSpec::required(
            "Channel Data ID",
            ValueSource::Claim("channelId".into()),
        ))
        .with_attribute(AttributeSpec::required(
            "Channel Data Image",
            ValueSource::Snapshot(SnapshotField::Image),
        ))
        .with_attribute(AttributeSpec::required("Proof", ValueSource::ClaimIdentifier))
    }

    /// The `titled` preset.
    #[must_use]
    pub fn titled() -> Self {
        Self::new(
            TextSpec::suffixed(ValueSource::Claim("title".into()), " YouTube Ownership NFT"),
            TextSpec::prefixed(
                "Proof of ownership for YouTube account: ",
                ValueSource::Claim("title".into()),
            ),
            ValueSource::Snapshot(SnapshotField::Image),
        )
        .with_attribute(AttributeSpec::required(
            "YouTube Channel",
            ValueSource::Claim("title".into()),
        ))
        .with_attribute(AttributeSpec::required(
            "Channel ID",
            ValueSource::Claim("channelId".into()),
        ))
        .with_attribute(AttributeSpec::optional(
            "Subscriber Count",
            ValueSource::Snapshot(SnapshotField::SubscriberCount),
        ))
        .with_attribute(AttributeSpec::required("Proof", ValueSource::ClaimIdentifier))
    }

    #[must_use]
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Names of every claim field this template reads.
    ///
    /// The proof plan must extract all of them.
    #[must_use]
    pub fn required_claim_fields(&self) -> BTreeSet<&str> {
        let sources = [self.name.source.as_ref(), self.description.source.as_ref()]
            .into_iter()
            .flatten()
            .chain(std::iter::once(&self.image))
            .chain(self.attributes.iter().map(|a| &a.source));

        sources
            .filter_map(|s| match s {
                ValueSource::Claim(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Default for MetadataTemplate {
    fn default() -> Self {
        Self::ownership()
    }
}

/// Maps a verified claim and a resource snapshot into [`NftMetadata`].
#[derive(Debug, Clone, Default)]
pub struct MetadataBuilder {
    template: MetadataTemplate,
}

impl MetadataBuilder {
    #[must_use]
    pub fn new(template: MetadataTemplate) -> Self {
        Self { template }
    }

    #[must_use]
    pub fn template(&self) -> &MetadataTemplate {
        &self.template
    }

    /// Builds the metadata document.
    ///
    /// # Errors
    ///
    /// Returns a `Schema` error if a required value is absent from the claim
    /// or the snapshot.
    pub fn build(
        &self,
        claim: &VerifiedClaim,
        snapshot: &ResourceSnapshot,
    ) -> Result<NftMetadata, PipelineError> {
        let name = self.template.name.render("name", claim, snapshot)?;
        let description = self
            .template
            .description
            .render("description", claim, snapshot)?;
        let image = self
            .template
            .image
            .resolve(claim, snapshot)
            .ok_or_else(|| missing("image", &self.template.image))?;

        let mut attributes = Vec::with_capacity(self.template.attributes.len());
        for spec in &self.template.attributes {
            match spec.source.resolve(claim, snapshot) {
                Some(value) => attributes.push(MetadataAttribute {
                    trait_type: spec.trait_type.clone(),
                    value,
                    verified: spec.source.is_verified(),
                }),
                None if spec.optional => {}
                None => return Err(missing(&spec.trait_type, &spec.source)),
            }
        }

        Ok(NftMetadata {
            name,
            description,
            image,
            attributes,
        })
    }
}

fn missing(part: &str, source: &ValueSource) -> PipelineError {
    PipelineError::schema(format!(
        "metadata `{part}` requires {source}, which is absent"
    ))
}
