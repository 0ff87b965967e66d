use std::path::Path;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use proofmint_auth::authorization_url;
use proofmint_core::{NftMetadata, PipelineError, RunRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Proofmint Server",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Redirects the browser to Google's consent screen.
pub async fn auth(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let consent_state = state.consents.issue();
    let url = authorization_url(&state.oauth, &consent_state).map_err(|e| {
        PipelineError::internal(format!("Failed to build consent URL: {e}"))
    })?;
    Ok(Redirect::to(url.as_str()))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Set by the provider when the user denies consent
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    #[serde(rename = "channelId")]
    pub channel_id: String,
    #[serde(rename = "tokenURI")]
    pub token_uri: String,
}

/// Runs the pipeline for the returned authorization code.
pub async fn oauth2callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<CallbackResponse>, ApiError> {
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        return Err(PipelineError::grant(format!("Authorization was denied: {error}")).into());
    }

    let mut request = RunRequest::new(params.code.unwrap_or_default());
    match params.state.as_deref() {
        Some(s) if state.consents.consume(s) => request = request.with_session_key(s),
        Some(_) => tracing::warn!("Callback carried an unknown or expired consent state"),
        None => {}
    }

    let outcome = state.orchestrator.run(request).await?;

    if let Some(path) = &state.snapshot_path {
        write_snapshot(path, &outcome.metadata).await;
    }
    let channel_id = outcome.channel_id().to_string();
    state.last_metadata.store(Some(outcome.metadata.into()));

    Ok(Json(CallbackResponse {
        channel_id,
        token_uri: outcome.artifact.uri,
    }))
}

/// Returns the last metadata document built by this process.
pub async fn get_metadata(State(state): State<AppState>) -> Response {
    match state.last_metadata.load_full() {
        Some(metadata) => (StatusCode::OK, Json(json!({ "metadata": metadata.as_ref() }))).into_response(),
        None => (StatusCode::NOT_FOUND, "No metadata has been built yet.").into_response(),
    }
}

async fn write_snapshot(path: &Path, metadata: &NftMetadata) {
    let bytes = match serde_json::to_vec_pretty(metadata) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize metadata snapshot");
            return;
        }
    };
    if let Err(e) = tokio::fs::write(path, bytes).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to write metadata snapshot");
    }
}
