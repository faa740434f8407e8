//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use program_core::{PortError, ProgramError};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A business error raised by the program engine.
    #[error(transparent)]
    Program(#[from] ProgramError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller identity header was missing or malformed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A request body or query string that could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        ApiError::Program(err.into())
    }
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut blocking_day = None;
        let (status, code, message) = match &self {
            ApiError::Program(program) => match program {
                ProgramError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                ProgramError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", program.to_string())
                }
                ProgramError::AccessDenied { blocking_day: day } => {
                    blocking_day = Some(day.get());
                    (StatusCode::FORBIDDEN, "ACCESS_DENIED", program.to_string())
                }
                ProgramError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                ProgramError::Internal(msg) => {
                    error!(error = %msg, "Internal program error");
                    internal()
                }
            },
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            other => {
                error!(error = %other, "Unhandled API error");
                internal()
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(day) = blocking_day {
            body["blockingDay"] = json!(day);
        }

        (status, Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
