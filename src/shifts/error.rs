use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for cash shift operations
#[derive(Debug, thiserror::Error)]
pub enum ShiftError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Shift not found")]
    NotFound,

    #[error("No open shift")]
    NoOpenShift,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid shift state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    ValidationFailed(String),

    #[error("Access denied")]
    AccessDenied,
}

impl From<sqlx::Error> for ShiftError {
    fn from(err: sqlx::Error) -> Self {
        ShiftError::Database(err.to_string())
    }
}

impl IntoResponse for ShiftError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ShiftError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ShiftError::NotFound => (StatusCode::NOT_FOUND, "Shift not found".to_string()),
            ShiftError::NoOpenShift => (
                StatusCode::BAD_REQUEST,
                "No open shift for this cashier".to_string(),
            ),
            ShiftError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ShiftError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg),
            ShiftError::ValidationFailed(msg) => (StatusCode::BAD_REQUEST, msg),
            ShiftError::AccessDenied => (StatusCode::FORBIDDEN, "Access denied".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
