use sqlx::PgPool;
use uuid::Uuid;

use crate::inventory::error::InventoryError;
use crate::inventory::models::{InventoryRecord, LowStockRow};

/// Repository for inventory data access
#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InventoryRecord>, InventoryError> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            r#"
            SELECT id, product_variant_id, store_id, quantity, reorder_level, updated_at
            FROM inventory
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn find_by_variant_and_store(
        &self,
        product_variant_id: Uuid,
        store_id: Uuid,
    ) -> Result<Option<InventoryRecord>, InventoryError> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            r#"
            SELECT id, product_variant_id, store_id, quantity, reorder_level, updated_at
            FROM inventory
            WHERE product_variant_id = $1 AND store_id = $2
            "#,
        )
        .bind(product_variant_id)
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Apply a signed stock delta in one statement. The WHERE clause refuses
    /// any adjustment that would take the quantity negative, so two racing
    /// adjustments can never drive stock below zero.
    ///
    /// Returns the updated record, or `None` when the adjustment was refused
    /// (either no record exists or it would go negative).
    pub async fn adjust(
        &self,
        product_variant_id: Uuid,
        store_id: Uuid,
        delta: i32,
    ) -> Result<Option<InventoryRecord>, InventoryError> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            r#"
            UPDATE inventory
            SET quantity = quantity + $3, updated_at = NOW()
            WHERE product_variant_id = $1 AND store_id = $2 AND quantity + $3 >= 0
            RETURNING id, product_variant_id, store_id, quantity, reorder_level, updated_at
            "#,
        )
        .bind(product_variant_id)
        .bind(store_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Upsert used when stock comes back for a variant with no inventory row
    /// yet (e.g. the row was created after the original sale).
    pub async fn add_or_create(
        &self,
        product_variant_id: Uuid,
        store_id: Uuid,
        quantity: i32,
    ) -> Result<InventoryRecord, InventoryError> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            r#"
            INSERT INTO inventory (product_variant_id, store_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_variant_id, store_id)
            DO UPDATE SET quantity = inventory.quantity + EXCLUDED.quantity, updated_at = NOW()
            RETURNING id, product_variant_id, store_id, quantity, reorder_level, updated_at
            "#,
        )
        .bind(product_variant_id)
        .bind(store_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_for_store(
        &self,
        store_id: Uuid,
    ) -> Result<Vec<InventoryRecord>, InventoryError> {
        let records = sqlx::query_as::<_, InventoryRecord>(
            r#"
            SELECT id, product_variant_id, store_id, quantity, reorder_level, updated_at
            FROM inventory
            WHERE store_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Variants at or below their reorder level, joined with catalog identity
    pub async fn low_stock(&self, store_id: Uuid) -> Result<Vec<LowStockRow>, InventoryError> {
        let rows = sqlx::query_as::<_, LowStockRow>(
            r#"
            SELECT i.product_variant_id, i.store_id, i.quantity, i.reorder_level,
                   v.sku, p.name AS product_name, v.name AS variant_name
            FROM inventory i
            JOIN product_variants v ON v.id = i.product_variant_id
            JOIN products p ON p.id = v.product_id
            WHERE i.store_id = $1 AND i.quantity <= i.reorder_level
            ORDER BY i.quantity ASC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
