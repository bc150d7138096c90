use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::ActorContext;
use crate::orders::models::{
    AddItemByBarcodeRequest, AddItemRequest, CancelOrderRequest, CreateOrderRequest,
    CreateReturnRequest, GetOrdersQuery, UpdateItemRequest, UpdateOrderRequest, VoidOrderRequest,
};
use crate::orders::OrderError;
use crate::AppState;

/// POST /api/orders
///
/// Creates a DRAFT sale; if the cashier has an open shift the order is
/// attached to it.
pub async fn create_order(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, OrderError> {
    payload
        .validate()
        .map_err(|e| OrderError::ValidationFailed(e.to_string()))?;

    let shift_id = state
        .shift_service
        .open_shift_id(&actor)
        .await
        .map_err(|e| OrderError::Database(e.to_string()))?;

    let order = state
        .order_service
        .create_order(payload, &actor, shift_id)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders
pub async fn get_orders(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(query): Query<GetOrdersQuery>,
) -> Result<impl IntoResponse, OrderError> {
    let orders = state.order_service.list_orders(query, &actor).await?;
    Ok(Json(orders))
}

/// GET /api/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, OrderError> {
    let order = state.order_service.get_order(order_id, &actor).await?;
    Ok(Json(order))
}

/// POST /api/orders/:id/items
pub async fn add_item(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, OrderError> {
    payload
        .validate()
        .map_err(|e| OrderError::ValidationFailed(e.to_string()))?;

    let item = state
        .order_service
        .add_item(order_id, payload, &actor)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// POST /api/orders/:id/items/barcode
pub async fn add_item_by_barcode(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AddItemByBarcodeRequest>,
) -> Result<impl IntoResponse, OrderError> {
    payload
        .validate()
        .map_err(|e| OrderError::ValidationFailed(e.to_string()))?;

    let result = state
        .order_service
        .add_item_by_barcode(order_id, payload, &actor)
        .await?;

    Ok(Json(result))
}

/// PATCH /api/orders/:id/items/:item_id
pub async fn update_item(
    State(state): State<AppState>,
    actor: ActorContext,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, OrderError> {
    payload
        .validate()
        .map_err(|e| OrderError::ValidationFailed(e.to_string()))?;

    let item = state
        .order_service
        .update_item(order_id, item_id, payload, &actor)
        .await?;

    Ok(Json(item))
}

/// DELETE /api/orders/:id/items/:item_id
pub async fn remove_item(
    State(state): State<AppState>,
    actor: ActorContext,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, OrderError> {
    state
        .order_service
        .remove_item(order_id, item_id, &actor)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/orders/:id
pub async fn update_order(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, OrderError> {
    payload
        .validate()
        .map_err(|e| OrderError::ValidationFailed(e.to_string()))?;

    let order = state
        .order_service
        .update_order_meta(order_id, payload, &actor)
        .await?;

    Ok(Json(order))
}

/// POST /api/orders/:id/confirm
pub async fn confirm_order(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, OrderError> {
    let order = state.order_service.confirm(order_id, &actor).await?;
    Ok(Json(order))
}

/// POST /api/orders/:id/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<CancelOrderRequest>,
) -> Result<impl IntoResponse, OrderError> {
    payload
        .validate()
        .map_err(|e| OrderError::ValidationFailed(e.to_string()))?;

    let order = state
        .order_service
        .cancel(order_id, payload, &actor)
        .await?;

    Ok(Json(order))
}

/// POST /api/orders/:id/return
pub async fn create_return(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<CreateReturnRequest>,
) -> Result<impl IntoResponse, OrderError> {
    payload
        .validate()
        .map_err(|e| OrderError::ValidationFailed(e.to_string()))?;

    let order = state
        .order_service
        .create_return_bill(order_id, payload, &actor)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// POST /api/orders/:id/void
pub async fn void_order(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<VoidOrderRequest>,
) -> Result<impl IntoResponse, OrderError> {
    payload
        .validate()
        .map_err(|e| OrderError::ValidationFailed(e.to_string()))?;

    let order = state
        .order_service
        .void_order(order_id, payload, &actor)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}
