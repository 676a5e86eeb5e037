//! Axum-specific error types and mappings.
//!
//! Error responses are short HTML-typed text bodies, matching what the
//! browser page displays verbatim.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tubefetch_core::CoreError;

/// Body of every rejected submission.
pub const INVALID_URL_MESSAGE: &str = "Invalid video URL";
/// Body of a missing static asset.
pub const FILE_NOT_FOUND_MESSAGE: &str = "File not found";
/// Body of an unknown route.
pub const PAGE_NOT_FOUND_MESSAGE: &str = "Page not found";

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    pub fn invalid_url() -> Self {
        Self::BadRequest(INVALID_URL_MESSAGE.to_string())
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::NotFound(msg) | Self::BadRequest(msg) | Self::Internal(msg) => msg,
        };
        (status, Html(body)).into_response()
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(reason) => {
                tracing::debug!(%reason, "Rejected submission");
                Self::invalid_url()
            }
            other => Self::Internal(other.to_string()),
        }
    }
}
