use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::auth::{ActorContext, Permission, Visibility};
use crate::inventory::InventoryService;
use crate::orders::models::{
    AddItemByBarcodeRequest, AddItemRequest, BarcodeAction, BarcodeAddResponse, CancelOrderRequest,
    CreateOrderRequest, CreateReturnRequest, NewOrder, NewOrderItem, Order, OrderFilter,
    OrderItem, OrderResponse, OrderStatus, OrderType, ReturnLineRequest, UpdateItemRequest,
    UpdateOrderRequest, VoidOrderRequest,
};
use crate::orders::repository::{OrdersRepository, VariantRepository};
use crate::orders::totals::TotalsCalculator;
use crate::orders::{OrderError, StatusMachine};

/// Build the negated line items for a reversal order.
///
/// Each requested line must reference an item of the original order and may
/// not exceed its quantity. Reversal lines carry the original unit price and
/// tax rate, a negated quantity and zero discount.
fn reversal_lines(
    original_items: &[OrderItem],
    requested: &[ReturnLineRequest],
) -> Result<Vec<NewOrderItem>, OrderError> {
    let mut lines = Vec::with_capacity(requested.len());

    for line in requested {
        let original = original_items
            .iter()
            .find(|item| item.id == line.original_item_id)
            .ok_or(OrderError::ItemNotFound)?;

        if line.quantity <= 0 {
            return Err(OrderError::ValidationFailed(
                "Return quantity must be positive".to_string(),
            ));
        }
        if line.quantity > original.quantity {
            return Err(OrderError::ValidationFailed(format!(
                "Return quantity ({}) exceeds sold quantity ({}) for item {}",
                line.quantity, original.quantity, original.sku
            )));
        }

        let totals = TotalsCalculator::line_item_totals(
            original.unit_price,
            -line.quantity,
            original.tax_rate,
            Decimal::ZERO,
        );

        lines.push(NewOrderItem {
            product_id: original.product_id,
            product_variant_id: original.product_variant_id,
            product_name: original.product_name.clone(),
            variant_name: original.variant_name.clone(),
            sku: original.sku.clone(),
            unit_price: original.unit_price,
            quantity: -line.quantity,
            tax_rate: original.tax_rate,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            discount_amount: Decimal::ZERO,
            total_amount: totals.total_amount,
        });
    }

    Ok(lines)
}

/// Narrow a list query to what the actor may see. Every scope short of
/// super-admin pins the filter to the actor's company, so a permissive
/// query can never cross tenants.
fn scoped_order_filter(
    query: crate::orders::models::GetOrdersQuery,
    actor: &ActorContext,
) -> Result<OrderFilter, OrderError> {
    let mut filter = OrderFilter {
        status: query.status,
        order_type: query.order_type,
        customer_type: query.customer_type,
        shift_id: query.shift_id,
        from: query.from,
        to: query.to,
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
        ..OrderFilter::default()
    };

    match actor.visibility() {
        Visibility::Own => {
            filter.company_id = Some(actor.company_id);
            filter.cashier_id = Some(actor.user_id);
        }
        Visibility::Store => {
            let store_id = actor.store_id.ok_or(OrderError::AccessDenied)?;
            filter.company_id = Some(actor.company_id);
            filter.store_id = Some(store_id);
        }
        Visibility::Company => {
            filter.company_id = Some(actor.company_id);
            filter.store_id = query.store_id;
        }
        Visibility::All => {
            filter.store_id = query.store_id;
            filter.cashier_id = query.cashier_id;
        }
    }

    Ok(filter)
}

/// Voiding is only allowed on the calendar day of the sale (local time),
/// not within a rolling 24 hour window.
fn is_same_local_day(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    created_at.with_timezone(&Local).date_naive() == now.with_timezone(&Local).date_naive()
}

/// Service for order lifecycle business logic
#[derive(Clone)]
pub struct OrderService {
    orders_repo: OrdersRepository,
    variant_repo: VariantRepository,
    inventory: InventoryService,
}

impl OrderService {
    pub fn new(
        orders_repo: OrdersRepository,
        variant_repo: VariantRepository,
        inventory: InventoryService,
    ) -> Self {
        Self {
            orders_repo,
            variant_repo,
            inventory,
        }
    }

    /// Create a new SALE order in DRAFT status with zero totals
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        actor: &ActorContext,
        shift_id: Option<Uuid>,
    ) -> Result<Order, OrderError> {
        let store_id = actor.store_id.ok_or_else(|| {
            OrderError::ValidationFailed("Actor is not assigned to a store".to_string())
        })?;

        let order = self
            .orders_repo
            .create(NewOrder {
                company_id: actor.company_id,
                store_id,
                cashier_id: actor.user_id,
                shift_id,
                customer_id: request.customer_id,
                parent_order_id: None,
                order_type: OrderType::Sale,
                customer_type: request.customer_type,
                customer_name: request.customer_name,
                customer_phone: request.customer_phone,
                notes: request.notes,
            })
            .await?;

        tracing::info!("Created order {} in store {}", order.order_number, store_id);
        Ok(order)
    }

    /// Add an item to a DRAFT order; price resolved by customer type,
    /// product identity snapshotted, totals computed server-side.
    pub async fn add_item(
        &self,
        order_id: Uuid,
        request: AddItemRequest,
        actor: &ActorContext,
    ) -> Result<OrderItem, OrderError> {
        let order = self.draft_order(order_id, actor).await?;

        let variant = self
            .variant_repo
            .find_by_id(request.product_variant_id)
            .await?
            .filter(|v| v.is_active && v.product_active)
            .ok_or(OrderError::VariantNotFound)?;

        let discount = request.discount_amount.unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO {
            return Err(OrderError::ValidationFailed(
                "Discount cannot be negative".to_string(),
            ));
        }

        let unit_price = variant.unit_price_for(order.customer_type);
        let totals = TotalsCalculator::line_item_totals(
            unit_price,
            request.quantity,
            variant.tax_percent,
            discount,
        );

        let item = self
            .orders_repo
            .add_item(
                order_id,
                NewOrderItem {
                    product_id: variant.product_id,
                    product_variant_id: variant.id,
                    product_name: variant.product_name,
                    variant_name: variant.variant_name,
                    sku: variant.sku,
                    unit_price,
                    quantity: request.quantity,
                    tax_rate: variant.tax_percent,
                    subtotal: totals.subtotal,
                    tax_amount: totals.tax_amount,
                    discount_amount: discount,
                    total_amount: totals.total_amount,
                },
            )
            .await?;

        self.recalculate_totals(order_id).await?;

        Ok(item)
    }

    /// Add an item by scanned barcode with stock validation; merges into an
    /// existing line for the same variant instead of creating a duplicate.
    pub async fn add_item_by_barcode(
        &self,
        order_id: Uuid,
        request: AddItemByBarcodeRequest,
        actor: &ActorContext,
    ) -> Result<BarcodeAddResponse, OrderError> {
        let order = self.draft_order(order_id, actor).await?;

        let variant = self
            .variant_repo
            .find_by_barcode(&request.barcode)
            .await?
            .ok_or(OrderError::VariantNotFound)?;

        if variant.company_id != order.company_id {
            return Err(OrderError::AccessDenied);
        }
        if !variant.is_active || !variant.product_active {
            return Err(OrderError::VariantNotFound);
        }

        let stock = self
            .inventory
            .quantity_on_hand(variant.id, order.store_id)
            .await
            .map_err(|err| OrderError::Database(err.to_string()))?;

        if stock <= 0 {
            return Err(OrderError::InsufficientStock(format!(
                "{} is out of stock",
                variant.sku
            )));
        }

        // Requested quantity counts on top of any line already holding this
        // variant, so the combined amount is what gets checked against stock.
        let existing = self
            .orders_repo
            .find_items(order_id)
            .await?
            .into_iter()
            .find(|item| item.product_variant_id == variant.id);

        match existing {
            Some(line) => {
                let combined = line.quantity + request.quantity;
                if combined > stock {
                    return Err(OrderError::InsufficientStock(format!(
                        "Only {} of {} in stock, {} requested",
                        stock, variant.sku, combined
                    )));
                }

                let totals = TotalsCalculator::line_item_totals(
                    line.unit_price,
                    combined,
                    line.tax_rate,
                    line.discount_amount,
                );
                let item = self
                    .orders_repo
                    .update_item(
                        line.id,
                        combined,
                        line.discount_amount,
                        totals.subtotal,
                        totals.tax_amount,
                        totals.total_amount,
                    )
                    .await?;

                self.recalculate_totals(order_id).await?;

                Ok(BarcodeAddResponse {
                    action: BarcodeAction::Updated,
                    item,
                })
            }
            None => {
                if request.quantity > stock {
                    return Err(OrderError::InsufficientStock(format!(
                        "Only {} of {} in stock, {} requested",
                        stock, variant.sku, request.quantity
                    )));
                }

                let item = self
                    .add_item(
                        order_id,
                        AddItemRequest {
                            product_variant_id: variant.id,
                            quantity: request.quantity,
                            discount_amount: request.discount_amount,
                        },
                        actor,
                    )
                    .await?;

                Ok(BarcodeAddResponse {
                    action: BarcodeAction::Added,
                    item,
                })
            }
        }
    }

    /// Update quantity and/or discount of an item on a DRAFT order
    pub async fn update_item(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        request: UpdateItemRequest,
        actor: &ActorContext,
    ) -> Result<OrderItem, OrderError> {
        self.draft_order(order_id, actor).await?;

        let item = self
            .orders_repo
            .find_item(item_id)
            .await?
            .filter(|item| item.order_id == order_id)
            .ok_or(OrderError::ItemNotFound)?;

        let quantity = request.quantity.unwrap_or(item.quantity);
        let discount = request.discount_amount.unwrap_or(item.discount_amount);

        if quantity <= 0 {
            return Err(OrderError::ValidationFailed(
                "Quantity must be positive".to_string(),
            ));
        }
        if discount < Decimal::ZERO {
            return Err(OrderError::ValidationFailed(
                "Discount cannot be negative".to_string(),
            ));
        }

        let totals =
            TotalsCalculator::line_item_totals(item.unit_price, quantity, item.tax_rate, discount);

        let updated = self
            .orders_repo
            .update_item(
                item_id,
                quantity,
                discount,
                totals.subtotal,
                totals.tax_amount,
                totals.total_amount,
            )
            .await?;

        self.recalculate_totals(order_id).await?;

        Ok(updated)
    }

    /// Remove an item from a DRAFT order
    pub async fn remove_item(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        actor: &ActorContext,
    ) -> Result<(), OrderError> {
        self.draft_order(order_id, actor).await?;

        self.orders_repo
            .find_item(item_id)
            .await?
            .filter(|item| item.order_id == order_id)
            .ok_or(OrderError::ItemNotFound)?;

        self.orders_repo.remove_item(item_id).await?;
        self.recalculate_totals(order_id).await?;

        Ok(())
    }

    /// Update customer info and notes on a DRAFT order
    pub async fn update_order_meta(
        &self,
        order_id: Uuid,
        request: UpdateOrderRequest,
        actor: &ActorContext,
    ) -> Result<Order, OrderError> {
        let order = self.draft_order(order_id, actor).await?;

        let updated = self
            .orders_repo
            .update_meta(
                order_id,
                request.customer_id.or(order.customer_id),
                request.customer_type.unwrap_or(order.customer_type),
                request.customer_name.or(order.customer_name),
                request.customer_phone.or(order.customer_phone),
                request.notes.or(order.notes),
            )
            .await?;

        Ok(updated)
    }

    /// Confirm an order (DRAFT → PENDING); requires at least one item
    pub async fn confirm(&self, order_id: Uuid, actor: &ActorContext) -> Result<Order, OrderError> {
        let order = self.visible_order(order_id, actor).await?;

        StatusMachine::transition(order.status, OrderStatus::Pending)
            .map_err(OrderError::InvalidState)?;
        if order.status != OrderStatus::Draft {
            return Err(OrderError::InvalidState(
                "Only DRAFT orders can be confirmed".to_string(),
            ));
        }

        let items = self.orders_repo.find_items(order_id).await?;
        if items.is_empty() {
            return Err(OrderError::InvalidState(
                "Cannot confirm order with no items".to_string(),
            ));
        }

        let confirmed = self
            .orders_repo
            .confirm(order_id)
            .await?
            .ok_or_else(|| OrderError::InvalidState("Only DRAFT orders can be confirmed".to_string()))?;

        tracing::info!("Order {} confirmed", confirmed.order_number);
        Ok(confirmed)
    }

    /// Cancel a DRAFT or PENDING order, recording reason and actor
    pub async fn cancel(
        &self,
        order_id: Uuid,
        request: CancelOrderRequest,
        actor: &ActorContext,
    ) -> Result<Order, OrderError> {
        let order = self.visible_order(order_id, actor).await?;

        if order.status != OrderStatus::Draft && order.status != OrderStatus::Pending {
            return Err(OrderError::InvalidState(
                "Only DRAFT or PENDING orders can be cancelled".to_string(),
            ));
        }

        let cancelled = self
            .orders_repo
            .cancel(order_id, actor.user_id, &request.cancel_reason)
            .await?
            .ok_or_else(|| {
                OrderError::InvalidState(
                    "Only DRAFT or PENDING orders can be cancelled".to_string(),
                )
            })?;

        tracing::info!(
            "Order {} cancelled by {}: {}",
            cancelled.order_number,
            actor.user_id,
            request.cancel_reason
        );
        Ok(cancelled)
    }

    /// Create a RETURN bill against a PAID SALE order.
    ///
    /// The return order starts as DRAFT and must be confirmed and settled
    /// (refunded) through the normal flow before it takes effect.
    pub async fn create_return_bill(
        &self,
        original_order_id: Uuid,
        request: CreateReturnRequest,
        actor: &ActorContext,
    ) -> Result<Order, OrderError> {
        let original = self.visible_order(original_order_id, actor).await?;

        if original.status != OrderStatus::Paid || original.order_type != OrderType::Sale {
            return Err(OrderError::InvalidState(
                "Returns can only be created against PAID SALE orders".to_string(),
            ));
        }

        let original_items = self.orders_repo.find_items(original_order_id).await?;
        let lines = reversal_lines(&original_items, &request.items)?;
        let totals = Self::reversal_totals(&lines);

        let order = self
            .orders_repo
            .create_reversal(
                NewOrder {
                    company_id: original.company_id,
                    store_id: original.store_id,
                    cashier_id: actor.user_id,
                    shift_id: None,
                    customer_id: original.customer_id,
                    parent_order_id: Some(original.id),
                    order_type: OrderType::Return,
                    customer_type: original.customer_type,
                    customer_name: original.customer_name,
                    customer_phone: original.customer_phone,
                    notes: Some(request.reason),
                },
                lines,
                totals,
            )
            .await?;

        tracing::info!(
            "Created return bill {} against order {}",
            order.order_number,
            original.order_number
        );
        Ok(order)
    }

    /// Void a PAID SALE order created today (full reversal of every line).
    /// Requires the VoidOrders capability.
    pub async fn void_order(
        &self,
        order_id: Uuid,
        request: VoidOrderRequest,
        actor: &ActorContext,
    ) -> Result<Order, OrderError> {
        if !actor.can(Permission::VoidOrders) {
            return Err(OrderError::Forbidden(
                "Voiding orders requires manager privileges".to_string(),
            ));
        }

        let original = self.visible_order(order_id, actor).await?;

        if original.status != OrderStatus::Paid || original.order_type != OrderType::Sale {
            return Err(OrderError::InvalidState(
                "Only PAID SALE orders can be voided".to_string(),
            ));
        }
        if !is_same_local_day(original.created_at, Utc::now()) {
            return Err(OrderError::InvalidState(
                "Orders can only be voided on the day they were created".to_string(),
            ));
        }

        let original_items = self.orders_repo.find_items(order_id).await?;
        let full_reversal: Vec<ReturnLineRequest> = original_items
            .iter()
            .map(|item| ReturnLineRequest {
                original_item_id: item.id,
                quantity: item.quantity,
            })
            .collect();

        let lines = reversal_lines(&original_items, &full_reversal)?;
        let totals = Self::reversal_totals(&lines);

        let order = self
            .orders_repo
            .create_reversal(
                NewOrder {
                    company_id: original.company_id,
                    store_id: original.store_id,
                    cashier_id: actor.user_id,
                    shift_id: None,
                    customer_id: original.customer_id,
                    parent_order_id: Some(original.id),
                    order_type: OrderType::Void,
                    customer_type: original.customer_type,
                    customer_name: original.customer_name,
                    customer_phone: original.customer_phone,
                    notes: Some(request.reason),
                },
                lines,
                totals,
            )
            .await?;

        tracing::info!(
            "Order {} voided as {} by {}",
            original.order_number,
            order.order_number,
            actor.user_id
        );
        Ok(order)
    }

    /// Post-settlement hook called when an order flips to PAID. Reversal
    /// orders put stock back; sale orders leave stock untouched here because
    /// deduction is committed by the fulfilment workflow, not at settlement.
    pub async fn handle_settlement(&self, order_id: Uuid) -> Result<(), OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.order_type.is_reversal() {
            self.restore_inventory_for_reversal(order_id).await
        } else {
            tracing::debug!(
                "Order {} settled; stock deduction deferred to fulfilment",
                order.order_number
            );
            Ok(())
        }
    }

    /// Put stock back for a settled reversal order: every negated line adds
    /// its quantity back to the store's inventory.
    pub async fn restore_inventory_for_reversal(&self, order_id: Uuid) -> Result<(), OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !order.order_type.is_reversal() {
            return Err(OrderError::InvalidState(
                "Inventory restoration only applies to RETURN/VOID orders".to_string(),
            ));
        }

        let items = self.orders_repo.find_items(order_id).await?;
        for item in items {
            let restore_qty = -item.quantity;
            if restore_qty <= 0 {
                continue;
            }
            self.inventory
                .restore(item.product_variant_id, order.store_id, restore_qty)
                .await
                .map_err(|err| OrderError::Database(err.to_string()))?;
        }

        tracing::info!(
            "Inventory restored for {} order {}",
            order.order_type,
            order.order_number
        );
        Ok(())
    }

    /// Fetch an order with role-based visibility applied
    pub async fn get_order(
        &self,
        order_id: Uuid,
        actor: &ActorContext,
    ) -> Result<OrderResponse, OrderError> {
        let order = self.visible_order(order_id, actor).await?;
        let items = self.orders_repo.find_items(order_id).await?;

        Ok(OrderResponse { order, items })
    }

    /// List orders; the actor's visibility narrows the filter before any
    /// query parameters are applied.
    pub async fn list_orders(
        &self,
        query: crate::orders::models::GetOrdersQuery,
        actor: &ActorContext,
    ) -> Result<Vec<Order>, OrderError> {
        let filter = scoped_order_filter(query, actor)?;
        self.orders_repo.list(&filter).await
    }

    fn reversal_totals(lines: &[NewOrderItem]) -> crate::orders::totals::OrderTotals {
        let subtotal: Decimal = lines.iter().map(|l| l.subtotal).sum();
        let tax_amount: Decimal = lines.iter().map(|l| l.tax_amount).sum();
        let discount_amount: Decimal = lines.iter().map(|l| l.discount_amount).sum();
        crate::orders::totals::OrderTotals {
            subtotal,
            tax_amount,
            discount_amount,
            total_amount: subtotal + tax_amount - discount_amount,
        }
    }

    /// Recompute order totals from current items and persist them.
    /// Called after every item mutation.
    async fn recalculate_totals(&self, order_id: Uuid) -> Result<(), OrderError> {
        let items = self.orders_repo.find_items(order_id).await?;
        let totals = TotalsCalculator::order_totals(&items);
        self.orders_repo.update_totals(order_id, totals).await
    }

    /// Fetch an order the actor may see, requiring DRAFT status
    async fn draft_order(
        &self,
        order_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Order, OrderError> {
        let order = self.visible_order(order_id, actor).await?;
        if order.status != OrderStatus::Draft {
            return Err(OrderError::InvalidState(
                "Cannot modify order that is not in DRAFT status".to_string(),
            ));
        }
        Ok(order)
    }

    /// Fetch an order and apply the actor's visibility rules
    async fn visible_order(
        &self,
        order_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Order, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        let allowed = match actor.visibility() {
            Visibility::Own => order.cashier_id == actor.user_id,
            Visibility::Store => actor.store_id == Some(order.store_id),
            Visibility::Company => order.company_id == actor.company_id,
            Visibility::All => true,
        };

        if !allowed {
            return Err(OrderError::AccessDenied);
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sold_item(quantity: i32, unit_price: Decimal, tax_rate: Decimal) -> OrderItem {
        let totals =
            TotalsCalculator::line_item_totals(unit_price, quantity, tax_rate, Decimal::ZERO);
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_variant_id: Uuid::new_v4(),
            product_name: "Widget".to_string(),
            variant_name: "Large".to_string(),
            sku: "WID-L".to_string(),
            unit_price,
            quantity,
            tax_rate,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            discount_amount: Decimal::ZERO,
            total_amount: totals.total_amount,
        }
    }

    #[test]
    fn test_reversal_lines_negate_original_values() {
        let original = sold_item(3, dec!(10), dec!(5));
        let lines = reversal_lines(
            &[original.clone()],
            &[ReturnLineRequest {
                original_item_id: original.id,
                quantity: 2,
            }],
        )
        .unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, -2);
        assert_eq!(lines[0].subtotal, dec!(-20));
        assert_eq!(lines[0].tax_amount, dec!(-1));
        assert_eq!(lines[0].total_amount, dec!(-21));
        assert_eq!(lines[0].discount_amount, Decimal::ZERO);
    }

    #[test]
    fn test_reversal_full_quantity_is_exact_negation() {
        let original = sold_item(3, dec!(10), dec!(5));
        let lines = reversal_lines(
            &[original.clone()],
            &[ReturnLineRequest {
                original_item_id: original.id,
                quantity: 3,
            }],
        )
        .unwrap();

        assert_eq!(lines[0].subtotal, -original.subtotal);
        assert_eq!(lines[0].tax_amount, -original.tax_amount);
        assert_eq!(lines[0].total_amount, -original.total_amount);
    }

    #[test]
    fn test_reversal_quantity_cannot_exceed_original() {
        let original = sold_item(3, dec!(10), dec!(5));
        let result = reversal_lines(
            &[original.clone()],
            &[ReturnLineRequest {
                original_item_id: original.id,
                quantity: 4,
            }],
        );

        assert!(matches!(result, Err(OrderError::ValidationFailed(_))));
    }

    #[test]
    fn test_reversal_unknown_item_rejected() {
        let original = sold_item(3, dec!(10), dec!(5));
        let result = reversal_lines(
            &[original],
            &[ReturnLineRequest {
                original_item_id: Uuid::new_v4(),
                quantity: 1,
            }],
        );

        assert!(matches!(result, Err(OrderError::ItemNotFound)));
    }

    #[test]
    fn test_same_local_day_boundary() {
        let morning = Local
            .with_ymd_and_hms(2025, 6, 10, 8, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let evening = Local
            .with_ymd_and_hms(2025, 6, 10, 23, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        let next_morning = Local
            .with_ymd_and_hms(2025, 6, 11, 0, 30, 0)
            .unwrap()
            .with_timezone(&Utc);

        // Same calendar day, even 15 hours apart.
        assert!(is_same_local_day(morning, evening));
        // One hour apart but across midnight: not voidable.
        assert!(!is_same_local_day(evening, next_morning));
    }

    mod list_scoping {
        use super::*;
        use crate::auth::Role;
        use crate::orders::models::GetOrdersQuery;

        fn actor(role: Role, store_id: Option<Uuid>) -> ActorContext {
            ActorContext {
                user_id: Uuid::new_v4(),
                email: "staff@example.com".to_string(),
                company_id: Uuid::new_v4(),
                store_id,
                role,
            }
        }

        #[test]
        fn test_cashier_scope_pins_company_and_cashier() {
            let actor = actor(Role::Cashier, Some(Uuid::new_v4()));
            let filter = scoped_order_filter(GetOrdersQuery::default(), &actor).unwrap();
            assert_eq!(filter.company_id, Some(actor.company_id));
            assert_eq!(filter.cashier_id, Some(actor.user_id));
        }

        #[test]
        fn test_manager_scope_pins_company_and_store() {
            let store_id = Uuid::new_v4();
            let actor = actor(Role::Manager, Some(store_id));
            let filter = scoped_order_filter(GetOrdersQuery::default(), &actor).unwrap();
            assert_eq!(filter.company_id, Some(actor.company_id));
            assert_eq!(filter.store_id, Some(store_id));
        }

        #[test]
        fn test_manager_without_store_is_denied() {
            let actor = actor(Role::Manager, None);
            let result = scoped_order_filter(GetOrdersQuery::default(), &actor);
            assert!(matches!(result, Err(OrderError::AccessDenied)));
        }

        #[test]
        fn test_admin_scope_pins_company_but_allows_store_filter() {
            let actor = actor(Role::Admin, None);
            let store_id = Uuid::new_v4();
            let query = GetOrdersQuery {
                store_id: Some(store_id),
                ..GetOrdersQuery::default()
            };
            let filter = scoped_order_filter(query, &actor).unwrap();
            assert_eq!(filter.company_id, Some(actor.company_id));
            assert_eq!(filter.store_id, Some(store_id));
        }

        #[test]
        fn test_cross_tenant_query_params_cannot_widen_scope() {
            // A cashier sending someone else's ids still only sees their own.
            let actor = actor(Role::Cashier, Some(Uuid::new_v4()));
            let query = GetOrdersQuery {
                cashier_id: Some(Uuid::new_v4()),
                store_id: Some(Uuid::new_v4()),
                ..GetOrdersQuery::default()
            };
            let filter = scoped_order_filter(query, &actor).unwrap();
            assert_eq!(filter.cashier_id, Some(actor.user_id));
            assert_eq!(filter.company_id, Some(actor.company_id));
        }
    }
}
