//! Domain error type shared by the control plane and the worker.
//!
//! Neither binary's transport layer lives here: the API crate wraps this in
//! its own `ApiError` to get an `axum::response::IntoResponse` impl, and the
//! worker matches on it directly to decide whether to ack a stream entry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InputValidation(String),

    #[error("authentication required")]
    AuthMissing,

    #[error("invalid or expired token")]
    AuthInvalid,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("Quota exceeded. Available: {available}")]
    QuotaExceeded { available: i64 },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
