use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::orders::OrderError;
use crate::shifts::ShiftError;

/// Error types for payment operations
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Payment not found")]
    NotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Invalid payment state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    ValidationFailed(String),

    #[error("An open shift is required for cash payments")]
    ShiftRequired,

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for PaymentError {
    fn from(err: sqlx::Error) -> Self {
        PaymentError::Database(err.to_string())
    }
}

impl From<ShiftError> for PaymentError {
    fn from(err: ShiftError) -> Self {
        match err {
            ShiftError::NoOpenShift => PaymentError::ShiftRequired,
            ShiftError::Database(msg) => PaymentError::Database(msg),
            other => PaymentError::Internal(other.to_string()),
        }
    }
}

impl From<OrderError> for PaymentError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound => PaymentError::OrderNotFound,
            OrderError::Database(msg) => PaymentError::Database(msg),
            OrderError::AccessDenied => PaymentError::AccessDenied,
            OrderError::InvalidState(msg) => PaymentError::InvalidState(msg),
            other => PaymentError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            PaymentError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            PaymentError::NotFound => (StatusCode::NOT_FOUND, "Payment not found".to_string()),
            PaymentError::OrderNotFound => (StatusCode::NOT_FOUND, "Order not found".to_string()),
            PaymentError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg),
            PaymentError::ValidationFailed(msg) => (StatusCode::BAD_REQUEST, msg),
            PaymentError::ShiftRequired => (
                StatusCode::BAD_REQUEST,
                "An open shift is required for cash payments".to_string(),
            ),
            PaymentError::Gateway(msg) => {
                tracing::error!("Gateway error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Payment gateway request failed".to_string(),
                )
            }
            PaymentError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            PaymentError::AccessDenied => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            PaymentError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
