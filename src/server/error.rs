//! Errors returned at the HTTP boundary

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request failure rendered as `{"detail": message}`
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client input rejected before any work is done
    #[error("{0}")]
    BadRequest(String),

    /// Malformed or oversized multipart body
    #[error("{}", .0.body_text())]
    Upload(#[from] MultipartError),

    /// Report request body that is not JSON or does not fit the schema
    #[error("{}", .0.body_text())]
    InvalidJson(#[from] JsonRejection),

    #[error("Failed to generate PDF: {0}")]
    Render(String),

    /// A blocking worker panicked or was cancelled
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upload(e) => e.status(),
            ApiError::InvalidJson(e) => e.status(),
            ApiError::Render(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("Only .py files are supported".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Render("bad chart".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_render_message() {
        let err = ApiError::Render("chart image is not valid base64".into());
        assert_eq!(
            err.to_string(),
            "Failed to generate PDF: chart image is not valid base64"
        );
    }
}
