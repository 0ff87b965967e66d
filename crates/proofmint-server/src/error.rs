//! Mapping of pipeline failures onto HTTP responses.
//!
//! Client-attributable kinds become `400` with the error's own message as a
//! plain-text body. Everything else becomes `500` with a fixed body; the
//! detail is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use proofmint_core::{PipelineError, PipelineFailure};

/// Body sent for unclassified and publish failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error.";

/// Handler error type.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        Self(error)
    }
}

impl From<PipelineFailure> for ApiError {
    fn from(failure: PipelineFailure) -> Self {
        Self(failure.error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = %self.0.kind(), error = %self.0, "request failed");
            return (status, INTERNAL_ERROR_MESSAGE).into_response();
        }
        (status, self.0.message().to_string()).into_response()
    }
}
