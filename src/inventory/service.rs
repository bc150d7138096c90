use uuid::Uuid;

use crate::auth::{ActorContext, Visibility};
use crate::inventory::error::InventoryError;
use crate::inventory::models::{AdjustInventoryRequest, InventoryRecord, LowStockRow};
use crate::inventory::repository::InventoryRepository;

/// Service for stock levels and manual adjustments
#[derive(Clone)]
pub struct InventoryService {
    repository: InventoryRepository,
}

impl InventoryService {
    pub fn new(repository: InventoryRepository) -> Self {
        Self { repository }
    }

    /// Current stock for a variant in a store; missing row reads as zero.
    pub async fn quantity_on_hand(
        &self,
        product_variant_id: Uuid,
        store_id: Uuid,
    ) -> Result<i32, InventoryError> {
        let record = self
            .repository
            .find_by_variant_and_store(product_variant_id, store_id)
            .await?;

        Ok(record.map(|r| r.quantity).unwrap_or(0))
    }

    /// Add stock back after a reversal order settles. Creates the inventory
    /// row if one does not exist yet.
    pub async fn restore(
        &self,
        product_variant_id: Uuid,
        store_id: Uuid,
        quantity: i32,
    ) -> Result<InventoryRecord, InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::ValidationFailed(
                "Restore quantity must be positive".to_string(),
            ));
        }

        let record = self
            .repository
            .add_or_create(product_variant_id, store_id, quantity)
            .await?;

        tracing::info!(
            "Restored {} units of variant {} in store {}",
            quantity,
            product_variant_id,
            store_id
        );
        Ok(record)
    }

    /// Manual adjustment with a required reason. The repository refuses
    /// adjustments that would take stock negative.
    pub async fn adjust(
        &self,
        request: AdjustInventoryRequest,
        actor: &ActorContext,
    ) -> Result<InventoryRecord, InventoryError> {
        self.check_store_access(request.store_id, actor)?;

        if request.delta == 0 {
            return Err(InventoryError::ValidationFailed(
                "Adjustment delta cannot be zero".to_string(),
            ));
        }

        let record = self
            .repository
            .adjust(request.product_variant_id, request.store_id, request.delta)
            .await?;

        match record {
            Some(record) => {
                tracing::info!(
                    "Inventory adjusted by {} for variant {} in store {} ({}): now {}",
                    request.delta,
                    request.product_variant_id,
                    request.store_id,
                    request.reason,
                    record.quantity
                );
                Ok(record)
            }
            None => {
                // Distinguish a missing row from a refused negative result.
                let existing = self
                    .repository
                    .find_by_variant_and_store(request.product_variant_id, request.store_id)
                    .await?;
                match existing {
                    Some(existing) => Err(InventoryError::InsufficientStock(format!(
                        "Adjustment of {} would take stock ({}) negative",
                        request.delta, existing.quantity
                    ))),
                    None => Err(InventoryError::NotFound),
                }
            }
        }
    }

    pub async fn get_record(
        &self,
        id: Uuid,
        actor: &ActorContext,
    ) -> Result<InventoryRecord, InventoryError> {
        let record = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(InventoryError::NotFound)?;
        self.check_store_access(record.store_id, actor)?;
        Ok(record)
    }

    pub async fn list_for_store(
        &self,
        store_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Vec<InventoryRecord>, InventoryError> {
        self.check_store_access(store_id, actor)?;
        self.repository.list_for_store(store_id).await
    }

    pub async fn low_stock(
        &self,
        store_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Vec<LowStockRow>, InventoryError> {
        self.check_store_access(store_id, actor)?;
        self.repository.low_stock(store_id).await
    }

    fn check_store_access(&self, store_id: Uuid, actor: &ActorContext) -> Result<(), InventoryError> {
        let allowed = match actor.visibility() {
            Visibility::Own | Visibility::Store => actor.store_id == Some(store_id),
            // Company scope is checked at the store level by the database
            // foreign keys; admins see all stores of their company.
            Visibility::Company | Visibility::All => true,
        };

        if allowed {
            Ok(())
        } else {
            Err(InventoryError::AccessDenied)
        }
    }
}
