use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Order not found")]
    NotFound,

    #[error("Order item not found")]
    ItemNotFound,

    #[error("Product variant not found or inactive")]
    VariantNotFound,

    #[error("Invalid order state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    ValidationFailed(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Database(err.to_string())
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            OrderError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            OrderError::NotFound => (StatusCode::NOT_FOUND, "Order not found".to_string()),
            OrderError::ItemNotFound => {
                (StatusCode::NOT_FOUND, "Order item not found".to_string())
            }
            OrderError::VariantNotFound => (
                StatusCode::NOT_FOUND,
                "Product variant not found or inactive".to_string(),
            ),
            OrderError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg),
            OrderError::ValidationFailed(msg) => (StatusCode::BAD_REQUEST, msg),
            OrderError::InsufficientStock(msg) => (StatusCode::BAD_REQUEST, msg),
            OrderError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            OrderError::AccessDenied => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            OrderError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
