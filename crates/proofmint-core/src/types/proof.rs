//! Proof request specs, opaque proofs and verified claims.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// HTTP method the proof engine uses to re-perform the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
        }
    }
}

/// A named field-match pattern.
///
/// The extraction rule is a regular expression that must contain a named
/// capture group matching the pattern name; the proof engine reports the
/// captured text under that name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPattern {
    name: String,
    regex: String,
}

impl FieldPattern {
    /// Creates a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns a `Schema` error if the expression does not compile or lacks
    /// a capture group named `name`.
    pub fn regex(name: impl Into<String>, regex: impl Into<String>) -> Result<Self, PipelineError> {
        let name = name.into();
        let regex = regex.into();

        if name.is_empty() {
            return Err(PipelineError::schema("field pattern name must not be empty"));
        }

        let compiled = Regex::new(&regex).map_err(|e| {
            PipelineError::schema(format!("field pattern `{name}` does not compile: {e}"))
        })?;

        if !compiled.capture_names().flatten().any(|group| group == name) {
            return Err(PipelineError::schema(format!(
                "field pattern `{name}` has no capture group named `{name}`"
            )));
        }

        Ok(Self { name, regex })
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the extraction rule.
    #[must_use]
    pub fn rule(&self) -> &str {
        &self.regex
    }
}

/// Everything the proof engine needs to independently reproduce the
/// authenticated fetch and prove its response matched the patterns.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ProofRequestSpec {
    /// Target URL.
    pub url: String,

    /// HTTP method.
    pub method: HttpMethod,

    /// Headers the engine must send (including the live bearer token).
    pub headers: BTreeMap<String, String>,

    /// Ordered field-match patterns.
    pub patterns: Vec<FieldPattern>,
}

impl ProofRequestSpec {
    /// Returns the pattern names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(FieldPattern::name)
    }

    /// Checks that a verified claim carries every field this request extracts.
    ///
    /// # Errors
    ///
    /// Returns a `Schema` error naming the first missing field.
    pub fn validate_claim(&self, claim: &VerifiedClaim) -> Result<(), PipelineError> {
        for name in self.field_names() {
            if claim.field(name).is_none_or(str::is_empty) {
                return Err(PipelineError::schema(format!(
                    "verified claim is missing extracted field `{name}`"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ProofRequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .keys()
            .map(|k| (k.as_str(), "[REDACTED]"))
            .collect();
        f.debug_struct("ProofRequestSpec")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &headers)
            .field("patterns", &self.patterns)
            .finish()
    }
}

/// Opaque signed blob returned by the proof engine.
///
/// Carries no guaranteed structure until a verifier has checked it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proof(serde_json::Value);

impl Proof {
    /// Wraps a raw proof document.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Returns the raw proof document.
    #[must_use]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Signature-checked, structurally parsed result of a proof.
///
/// Every field value appeared verbatim in the response the proof engine
/// fetched; that guarantee comes from the engine and is not re-checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedClaim {
    /// Claim identifier assigned by the proof system.
    pub identifier: String,

    /// Provider that produced the claim (e.g. `http`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Extracted field name → value.
    pub fields: BTreeMap<String, String>,

    /// Claim creation time (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_s: Option<u64>,
}

impl VerifiedClaim {
    /// Creates a claim with no extracted fields.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            provider: None,
            fields: BTreeMap::new(),
            timestamp_s: None,
        }
    }

    /// Adds an extracted field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns an extracted field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
