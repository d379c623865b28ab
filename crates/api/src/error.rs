//! Axum-facing error wrapper.
//!
//! Thin newtype over [`taskforge_shared::Error`] that adds `IntoResponse`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskforge_shared::Error;

#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::InputValidation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Error::AuthMissing | Error::AuthInvalid => {
                (StatusCode::UNAUTHORIZED, self.0.to_string())
            }
            Error::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            Error::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            Error::QuotaExceeded { .. } => (StatusCode::BAD_REQUEST, self.0.to_string()),
            Error::Conflict(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Error::Database(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
            Error::Queue(m) => {
                tracing::error!(error = %m, "queue error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
            Error::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
