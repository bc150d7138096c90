use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::orders::error::OrderError;
use crate::orders::models::{
    CustomerType, NewOrder, NewOrderItem, Order, OrderFilter, OrderItem, VariantRow,
};
use crate::orders::totals::OrderTotals;

const ORDER_COLUMNS: &str = "id, order_number, company_id, store_id, cashier_id, shift_id, \
     customer_id, parent_order_id, order_type, status, customer_type, customer_name, \
     customer_phone, subtotal, tax_amount, discount_amount, total_amount, notes, \
     cancel_reason, cancelled_by, cancelled_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_variant_id, product_name, \
     variant_name, sku, unit_price, quantity, tax_rate, subtotal, tax_amount, \
     discount_amount, total_amount";

/// Repository for product variant lookups (catalog is a thin collaborator)
#[derive(Clone)]
pub struct VariantRepository {
    pool: PgPool,
}

impl VariantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<VariantRow>, OrderError> {
        let variant = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT v.id, v.product_id, v.name AS variant_name, p.name AS product_name,
                   v.sku, v.barcode, v.retail_price, v.wholesale_price, p.tax_percent,
                   v.is_active, p.is_active AS product_active, p.company_id
            FROM product_variants v
            JOIN products p ON p.id = v.product_id
            WHERE v.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    pub async fn find_by_barcode(&self, barcode: &str) -> Result<Option<VariantRow>, OrderError> {
        let variant = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT v.id, v.product_id, v.name AS variant_name, p.name AS product_name,
                   v.sku, v.barcode, v.retail_price, v.wholesale_price, p.tax_percent,
                   v.is_active, p.is_active AS product_active, p.company_id
            FROM product_variants v
            JOIN products p ON p.id = v.product_id
            WHERE v.barcode = $1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }
}

/// Repository for order and order item operations
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Allocate the next order number for a store from the per-store per-day
    /// counter. The upsert increments atomically, so concurrent creations in
    /// the same store never mint the same number.
    async fn next_order_number(
        tx: &mut Transaction<'_, Postgres>,
        store_id: Uuid,
    ) -> Result<String, OrderError> {
        let day = Utc::now().date_naive();

        let seq: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO order_counters (store_id, day, seq)
            VALUES ($1, $2, 1)
            ON CONFLICT (store_id, day)
            DO UPDATE SET seq = order_counters.seq + 1
            RETURNING seq
            "#,
        )
        .bind(store_id)
        .bind(day)
        .fetch_one(&mut **tx)
        .await?;

        Ok(format!("ORD-{}-{:03}", day.format("%Y%m%d"), seq))
    }

    /// Create a new DRAFT order with zero totals
    pub async fn create(&self, data: NewOrder) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order_number = Self::next_order_number(&mut tx, data.store_id).await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (order_number, company_id, store_id, cashier_id, shift_id,
                                customer_id, parent_order_id, order_type, status,
                                customer_type, customer_name, customer_phone, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'draft', $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&order_number)
        .bind(data.company_id)
        .bind(data.store_id)
        .bind(data.cashier_id)
        .bind(data.shift_id)
        .bind(data.customer_id)
        .bind(data.parent_order_id)
        .bind(data.order_type)
        .bind(data.customer_type)
        .bind(&data.customer_name)
        .bind(&data.customer_phone)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(order)
    }

    /// Create a reversal (RETURN/VOID) order together with its negated items
    /// and precomputed totals, in one transaction.
    pub async fn create_reversal(
        &self,
        data: NewOrder,
        items: Vec<NewOrderItem>,
        totals: OrderTotals,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order_number = Self::next_order_number(&mut tx, data.store_id).await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (order_number, company_id, store_id, cashier_id, shift_id,
                                customer_id, parent_order_id, order_type, status,
                                customer_type, customer_name, customer_phone, notes,
                                subtotal, tax_amount, discount_amount, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'draft', $9, $10, $11, $12,
                    $13, $14, $15, $16)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&order_number)
        .bind(data.company_id)
        .bind(data.store_id)
        .bind(data.cashier_id)
        .bind(data.shift_id)
        .bind(data.customer_id)
        .bind(data.parent_order_id)
        .bind(data.order_type)
        .bind(data.customer_type)
        .bind(&data.customer_name)
        .bind(&data.customer_phone)
        .bind(&data.notes)
        .bind(totals.subtotal)
        .bind(totals.tax_amount)
        .bind(totals.discount_amount)
        .bind(totals.total_amount)
        .fetch_one(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, product_variant_id,
                                         product_name, variant_name, sku, unit_price,
                                         quantity, tax_rate, subtotal, tax_amount,
                                         discount_amount, total_amount)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.product_variant_id)
            .bind(&item.product_name)
            .bind(&item.variant_name)
            .bind(&item.sku)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.tax_rate)
            .bind(item.subtotal)
            .bind(item.tax_amount)
            .bind(item.discount_amount)
            .bind(item.total_amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    pub async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    pub async fn find_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, OrderError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn find_item(&self, item_id: Uuid) -> Result<Option<OrderItem>, OrderError> {
        let item = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn add_item(
        &self,
        order_id: Uuid,
        item: NewOrderItem,
    ) -> Result<OrderItem, OrderError> {
        let inserted = sqlx::query_as::<_, OrderItem>(&format!(
            r#"
            INSERT INTO order_items (order_id, product_id, product_variant_id, product_name,
                                     variant_name, sku, unit_price, quantity, tax_rate,
                                     subtotal, tax_amount, discount_amount, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.product_variant_id)
        .bind(&item.product_name)
        .bind(&item.variant_name)
        .bind(&item.sku)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(item.tax_rate)
        .bind(item.subtotal)
        .bind(item.tax_amount)
        .bind(item.discount_amount)
        .bind(item.total_amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    pub async fn update_item(
        &self,
        item_id: Uuid,
        quantity: i32,
        discount_amount: Decimal,
        subtotal: Decimal,
        tax_amount: Decimal,
        total_amount: Decimal,
    ) -> Result<OrderItem, OrderError> {
        let item = sqlx::query_as::<_, OrderItem>(&format!(
            r#"
            UPDATE order_items
            SET quantity = $1, discount_amount = $2, subtotal = $3,
                tax_amount = $4, total_amount = $5
            WHERE id = $6
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(quantity)
        .bind(discount_amount)
        .bind(subtotal)
        .bind(tax_amount)
        .bind(total_amount)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::ItemNotFound)?;

        Ok(item)
    }

    pub async fn remove_item(&self, item_id: Uuid) -> Result<(), OrderError> {
        let result = sqlx::query("DELETE FROM order_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrderError::ItemNotFound);
        }

        Ok(())
    }

    /// Persist recomputed order totals
    pub async fn update_totals(
        &self,
        order_id: Uuid,
        totals: OrderTotals,
    ) -> Result<(), OrderError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET subtotal = $1, tax_amount = $2, discount_amount = $3,
                total_amount = $4, updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(totals.subtotal)
        .bind(totals.tax_amount)
        .bind(totals.discount_amount)
        .bind(totals.total_amount)
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_meta(
        &self,
        order_id: Uuid,
        customer_id: Option<Uuid>,
        customer_type: CustomerType,
        customer_name: Option<String>,
        customer_phone: Option<String>,
        notes: Option<String>,
    ) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET customer_id = $1, customer_type = $2, customer_name = $3,
                customer_phone = $4, notes = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(customer_id)
        .bind(customer_type)
        .bind(customer_name)
        .bind(customer_phone)
        .bind(notes)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::NotFound)?;

        Ok(order)
    }

    /// Conditional DRAFT → PENDING transition; returns None when the order
    /// is no longer in DRAFT (lost race or wrong state).
    pub async fn confirm(&self, order_id: Uuid) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = 'pending', updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Conditional cancellation of a DRAFT/PENDING order with audit fields
    pub async fn cancel(
        &self,
        order_id: Uuid,
        cancelled_by: Uuid,
        cancel_reason: &str,
    ) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = 'cancelled', cancel_reason = $1, cancelled_by = $2,
                cancelled_at = NOW(), updated_at = NOW()
            WHERE id = $3 AND status IN ('draft', 'pending')
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(cancel_reason)
        .bind(cancelled_by)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));

        if let Some(company_id) = filter.company_id {
            builder.push(" AND company_id = ").push_bind(company_id);
        }
        if let Some(store_id) = filter.store_id {
            builder.push(" AND store_id = ").push_bind(store_id);
        }
        if let Some(cashier_id) = filter.cashier_id {
            builder.push(" AND cashier_id = ").push_bind(cashier_id);
        }
        if let Some(shift_id) = filter.shift_id {
            builder.push(" AND shift_id = ").push_bind(shift_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(order_type) = filter.order_type {
            builder.push(" AND order_type = ").push_bind(order_type);
        }
        if let Some(customer_type) = filter.customer_type {
            builder.push(" AND customer_type = ").push_bind(customer_type);
        }
        if let Some(from) = filter.from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND created_at <= ").push_bind(to);
        }

        let offset = (filter.page.max(1) - 1) * filter.limit;
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let orders = builder
            .build_query_as::<Order>()
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }
}
