use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::ActorContext;
use crate::inventory::error::InventoryError;
use crate::inventory::models::AdjustInventoryRequest;
use crate::AppState;

/// POST /api/inventory/adjust
pub async fn adjust_inventory(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<AdjustInventoryRequest>,
) -> Result<impl IntoResponse, InventoryError> {
    payload
        .validate()
        .map_err(|e| InventoryError::ValidationFailed(e.to_string()))?;

    let record = state.inventory_service.adjust(payload, &actor).await?;
    Ok(Json(record))
}

/// GET /api/inventory/:id
pub async fn get_inventory_record(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, InventoryError> {
    let record = state.inventory_service.get_record(id, &actor).await?;
    Ok(Json(record))
}

/// GET /api/inventory/stores/:store_id
pub async fn get_store_inventory(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, InventoryError> {
    let records = state
        .inventory_service
        .list_for_store(store_id, &actor)
        .await?;
    Ok(Json(records))
}

/// GET /api/inventory/stores/:store_id/low-stock
pub async fn get_low_stock(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, InventoryError> {
    let rows = state.inventory_service.low_stock(store_id, &actor).await?;
    Ok(Json(rows))
}
