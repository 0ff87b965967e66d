//! Structural parsing of proof documents.
//!
//! Two layouts are accepted:
//!
//! - the raw zkFetch proof: `identifier`, `claimData { provider, context,
//!   identifier, timestampS }`, `signatures`, `extractedParameterValues`
//! - the on-chain layout: `claimInfo { provider, context }`,
//!   `signedClaim { claim { identifier, timestampS }, signatures }`
//!
//! `context` is a JSON string whose `extractedParameters` object holds the
//! values captured by the response-match patterns.

use std::collections::BTreeMap;

use proofmint_core::{Proof, VerifiedClaim};
use serde_json::Value;

use crate::error::ProofServiceError;

/// Parses a proof into a [`VerifiedClaim`]. Pure; equal proofs yield equal claims.
///
/// # Errors
///
/// Returns `MalformedProof` if the proof has no identifier or no extracted
/// parameters.
pub fn parse_claim(proof: &Proof) -> Result<VerifiedClaim, ProofServiceError> {
    let doc = proof.as_value();
    let claim_info = doc.get("claimData").or_else(|| doc.get("claimInfo"));
    let signed_claim = doc.pointer("/signedClaim/claim");

    let identifier = [
        doc.get("identifier"),
        claim_info.and_then(|c| c.get("identifier")),
        signed_claim.and_then(|c| c.get("identifier")),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|s| !s.is_empty())
    .ok_or_else(|| ProofServiceError::malformed("proof has no claim identifier"))?;

    let fields = context_parameters(claim_info)?
        .or_else(|| doc.get("extractedParameterValues").and_then(string_map))
        .ok_or_else(|| ProofServiceError::malformed("proof has no extracted parameters"))?;

    let provider = claim_info
        .and_then(|c| c.get("provider"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let timestamp_s = [
        claim_info.and_then(|c| c.get("timestampS")),
        signed_claim.and_then(|c| c.get("timestampS")),
    ]
    .into_iter()
    .flatten()
    .find_map(Value::as_u64);

    Ok(VerifiedClaim {
        identifier: identifier.to_string(),
        provider,
        fields,
        timestamp_s,
    })
}

/// Returns the claim signatures, wherever the layout keeps them.
#[must_use]
pub fn signatures(proof: &Proof) -> Vec<&str> {
    let doc = proof.as_value();
    doc.get("signatures")
        .or_else(|| doc.pointer("/signedClaim/signatures"))
        .and_then(Value::as_array)
        .map(|sigs| sigs.iter().filter_map(Value::as_str).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn context_parameters(
    claim_info: Option<&Value>,
) -> Result<Option<BTreeMap<String, String>>, ProofServiceError> {
    let Some(context) = claim_info.and_then(|c| c.get("context")) else {
        return Ok(None);
    };

    let parsed: Value = match context {
        Value::String(raw) if raw.is_empty() => return Ok(None),
        Value::String(raw) => serde_json::from_str(raw)
            .map_err(|e| ProofServiceError::malformed(format!("claim context is not JSON: {e}")))?,
        Value::Object(_) => context.clone(),
        _ => return Err(ProofServiceError::malformed("claim context has an unexpected type")),
    };

    Ok(parsed.get("extractedParameters").and_then(string_map))
}

fn string_map(value: &Value) -> Option<BTreeMap<String, String>> {
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((k.clone(), text))
            })
            .collect(),
    )
}
