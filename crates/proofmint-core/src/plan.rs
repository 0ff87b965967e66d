//! Proof plans: how to turn a fetched snapshot into a [`ProofRequestSpec`].

use std::collections::BTreeMap;

use crate::error::PipelineError;
use crate::metadata::MetadataTemplate;
use crate::types::{FieldPattern, HttpMethod, ProofRequestSpec, ResourceSnapshot, TokenSet};

/// Default YouTube Data API base URL.
pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

const CHANNEL_ID_PATTERN: &str = r#""id":\s*"(?<channelId>[^"]+)""#;
const TITLE_PATTERN: &str = r#""title":\s*"(?<title>[^"]+)""#;

/// Factory for proof request specs.
///
/// The plan fixes the target endpoint and the ordered field patterns; each
/// run fills in the resource id and the live bearer token.
#[derive(Debug, Clone)]
pub struct ProofPlan {
    api_base: String,
    method: HttpMethod,
    patterns: Vec<FieldPattern>,
}

impl ProofPlan {
    /// Plan proving a YouTube channel's id and title.
    ///
    /// # Errors
    ///
    /// Returns a `Schema` error if a built-in pattern fails to compile.
    pub fn youtube_channel(api_base: impl Into<String>) -> Result<Self, PipelineError> {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Ok(Self {
            api_base,
            method: HttpMethod::Get,
            patterns: vec![
                FieldPattern::regex("channelId", CHANNEL_ID_PATTERN)?,
                FieldPattern::regex("title", TITLE_PATTERN)?,
            ],
        })
    }

    /// Appends an extra field pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: FieldPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    #[must_use]
    pub fn patterns(&self) -> &[FieldPattern] {
        &self.patterns
    }

    /// Builds the request the proof engine must reproduce for this snapshot.
    #[must_use]
    pub fn request_for(&self, snapshot: &ResourceSnapshot, tokens: &TokenSet) -> ProofRequestSpec {
        let url = format!(
            "{}/channels?part=snippet,statistics&id={}",
            self.api_base, snapshot.id
        );
        let headers =
            BTreeMap::from([("Authorization".to_string(), tokens.authorization_header())]);

        ProofRequestSpec {
            url,
            method: self.method,
            headers,
            patterns: self.patterns.clone(),
        }
    }

    /// Checks that every claim field the template reads is extracted here.
    ///
    /// # Errors
    ///
    /// Returns a `Schema` error naming the fields the plan does not cover.
    pub fn ensure_covers(&self, template: &MetadataTemplate) -> Result<(), PipelineError> {
        let uncovered: Vec<&str> = template
            .required_claim_fields()
            .into_iter()
            .filter(|field| !self.patterns.iter().any(|p| p.name() == *field))
            .collect();

        if uncovered.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::schema(format!(
                "metadata template reads claim fields not extracted by the proof plan: {}",
                uncovered.join(", ")
            )))
        }
    }
}
