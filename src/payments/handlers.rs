use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::ActorContext;
use crate::payments::error::PaymentError;
use crate::payments::models::{CreatePaymentRequest, GetPaymentsQuery, RefundPaymentRequest};
use crate::AppState;

/// POST /api/payments
pub async fn create_payment(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, PaymentError> {
    payload
        .validate()
        .map_err(|e| PaymentError::ValidationFailed(e.to_string()))?;

    let response = state.payment_service.create_payment(payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/payments
pub async fn get_payments(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(query): Query<GetPaymentsQuery>,
) -> Result<impl IntoResponse, PaymentError> {
    let payments = state.payment_service.list_payments(query, &actor).await?;
    Ok(Json(payments))
}

/// GET /api/payments/:id
pub async fn get_payment(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, PaymentError> {
    let payment = state.payment_service.get_payment(payment_id, &actor).await?;
    Ok(Json(payment))
}

/// GET /api/orders/:id/payments
pub async fn get_order_payments(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, PaymentError> {
    let payments = state
        .payment_service
        .order_payments(order_id, &actor)
        .await?;
    Ok(Json(payments))
}

/// GET /api/orders/:id/payments/summary
pub async fn get_order_payment_summary(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, PaymentError> {
    let summary = state
        .payment_service
        .order_payment_summary(order_id, &actor)
        .await?;
    Ok(Json(summary))
}

/// POST /api/payments/:id/refund
pub async fn refund_payment(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(payment_id): Path<Uuid>,
    Json(payload): Json<RefundPaymentRequest>,
) -> Result<impl IntoResponse, PaymentError> {
    payload
        .validate()
        .map_err(|e| PaymentError::ValidationFailed(e.to_string()))?;

    let payment = state
        .payment_service
        .refund(payment_id, payload, &actor)
        .await?;
    Ok(Json(payment))
}

/// GET /api/shifts/:id/payments/summary
pub async fn get_shift_payment_summary(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(shift_id): Path<Uuid>,
) -> Result<impl IntoResponse, PaymentError> {
    let summary = state
        .payment_service
        .shift_summary(shift_id, &actor)
        .await?;
    Ok(Json(summary))
}

/// POST /api/payments/webhook
///
/// The provider retries on non-2xx, so processing failures are logged and
/// acknowledged; only a bad signature or body is rejected outright.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let signature = headers
        .get("x-gateway-signature")
        .and_then(|v| v.to_str().ok());

    match state
        .payment_service
        .handle_webhook(body.as_bytes(), signature)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "received": true }))),
        Err(PaymentError::ValidationFailed(msg)) => {
            tracing::warn!("Webhook rejected: {}", msg);
            (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
        }
        Err(err) => {
            tracing::error!("Webhook processing failed: {}", err);
            (StatusCode::OK, Json(json!({ "received": true })))
        }
    }
}
