use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for inventory operations
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Inventory record not found")]
    NotFound,

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Validation error: {0}")]
    ValidationFailed(String),

    #[error("Access denied")]
    AccessDenied,
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        InventoryError::Database(err.to_string())
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            InventoryError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            InventoryError::NotFound => (
                StatusCode::NOT_FOUND,
                "Inventory record not found".to_string(),
            ),
            InventoryError::InsufficientStock(msg) => (StatusCode::BAD_REQUEST, msg),
            InventoryError::ValidationFailed(msg) => (StatusCode::BAD_REQUEST, msg),
            InventoryError::AccessDenied => {
                (StatusCode::FORBIDDEN, "Access denied".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
