use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Stock on hand for one product variant in one store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub product_variant_id: Uuid,
    pub store_id: Uuid,
    pub quantity: i32,
    pub reorder_level: i32,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for a manual stock adjustment.
///
/// `delta` is signed: positive for received stock, negative for shrinkage.
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustInventoryRequest {
    pub product_variant_id: Uuid,
    pub store_id: Uuid,
    #[validate(range(min = -100_000, max = 100_000, message = "Delta out of range"))]
    pub delta: i32,
    #[validate(length(min = 1, message = "Adjustment reason is required"))]
    pub reason: String,
}

/// Low stock row joined with catalog identity for display
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockRow {
    pub product_variant_id: Uuid,
    pub store_id: Uuid,
    pub quantity: i32,
    pub reorder_level: i32,
    pub sku: String,
    pub product_name: String,
    pub variant_name: String,
}

/// Query parameters for stock lookups
#[derive(Debug, Default, Deserialize)]
pub struct GetInventoryQuery {
    pub store_id: Option<Uuid>,
    pub product_variant_id: Option<Uuid>,
}
