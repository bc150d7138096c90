use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Order status enum representing the lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Draft
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order type: a SALE, or a reversal (RETURN/VOID) linked to a parent sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Sale,
    Return,
    Void,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Sale => "sale",
            OrderType::Return => "return",
            OrderType::Void => "void",
        }
    }

    /// Reversal orders carry negated line items and restore stock when paid.
    pub fn is_reversal(&self) -> bool {
        matches!(self, OrderType::Return | OrderType::Void)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Customer type drives unit-price resolution (wholesale price when set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    Retail,
    Wholesale,
}

impl Default for CustomerType {
    fn default() -> Self {
        CustomerType::Retail
    }
}

/// Domain model representing an order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub company_id: Uuid,
    pub store_id: Uuid,
    pub cashier_id: Uuid,
    pub shift_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub parent_order_id: Option<Uuid>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub customer_type: CustomerType,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line item with a denormalized snapshot of product identity and pricing
/// at the time of sale; immutable once the parent order leaves DRAFT.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_variant_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
}

/// Product variant lookup row (catalog is a read-only collaborator here)
#[derive(Debug, Clone, FromRow)]
pub struct VariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_name: String,
    pub product_name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub retail_price: Decimal,
    pub wholesale_price: Option<Decimal>,
    pub tax_percent: Decimal,
    pub is_active: bool,
    pub product_active: bool,
    pub company_id: Uuid,
}

impl VariantRow {
    /// WHOLESALE customers get the wholesale price when one is set,
    /// everyone else pays retail.
    pub fn unit_price_for(&self, customer_type: CustomerType) -> Decimal {
        match (customer_type, self.wholesale_price) {
            (CustomerType::Wholesale, Some(price)) => price,
            _ => self.retail_price,
        }
    }
}

/// Request DTO for creating a new order (DRAFT)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub customer_type: CustomerType,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

/// Request DTO for adding an item to an order
#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_variant_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub discount_amount: Option<Decimal>,
}

/// Request DTO for adding an item by scanned barcode
#[derive(Debug, Deserialize, Validate)]
pub struct AddItemByBarcodeRequest {
    #[validate(length(min = 1, message = "Barcode is required"))]
    pub barcode: String,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub discount_amount: Option<Decimal>,
}

/// Request DTO for updating an order item
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: Option<i32>,
    pub discount_amount: Option<Decimal>,
}

/// Request DTO for updating order details (only in DRAFT status)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub customer_id: Option<Uuid>,
    pub customer_type: Option<CustomerType>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

/// Request DTO for cancelling an order
#[derive(Debug, Deserialize, Validate)]
pub struct CancelOrderRequest {
    #[validate(length(min = 1, message = "Cancel reason is required"))]
    pub cancel_reason: String,
}

/// One line of a return bill, referencing an item of the original order
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReturnLineRequest {
    pub original_item_id: Uuid,
    #[validate(range(min = 1, message = "Return quantity must be positive"))]
    pub quantity: i32,
}

/// Request DTO for creating a RETURN bill against a paid sale
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReturnRequest {
    #[validate(length(min = 1, message = "Return reason is required"))]
    pub reason: String,
    #[validate(length(min = 1, message = "At least one return line is required"))]
    pub items: Vec<ReturnLineRequest>,
}

/// Request DTO for voiding a same-day paid sale (full reversal)
#[derive(Debug, Deserialize, Validate)]
pub struct VoidOrderRequest {
    #[validate(length(min = 1, message = "Void reason is required"))]
    pub reason: String,
}

/// Query parameters for listing orders; every supported filter field is
/// spelled out rather than accepting arbitrary key/value pairs.
#[derive(Debug, Default, Deserialize)]
pub struct GetOrdersQuery {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub customer_type: Option<CustomerType>,
    pub cashier_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub shift_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Fully resolved order list filter after role-based scoping
#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    pub company_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub cashier_id: Option<Uuid>,
    pub shift_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub customer_type: Option<CustomerType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: i64,
    pub limit: i64,
}

/// Response DTO for an order with its items
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Outcome of a barcode scan against a draft order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeAction {
    /// A new line was created for the variant.
    Added,
    /// An existing line for the same variant was merged (quantity increased).
    Updated,
}

#[derive(Debug, Serialize)]
pub struct BarcodeAddResponse {
    pub action: BarcodeAction,
    pub item: OrderItem,
}

/// Insert payload for a new order item (totals already computed)
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub product_variant_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
}

/// Insert payload for a new order header
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub company_id: Uuid,
    pub store_id: Uuid,
    pub cashier_id: Uuid,
    pub shift_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub parent_order_id: Option<Uuid>,
    pub order_type: OrderType,
    pub customer_type: CustomerType,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_request_rejects_empty_lines() {
        let request = CreateReturnRequest {
            reason: "damaged".to_string(),
            items: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_return_request_accepts_populated_lines() {
        let request = CreateReturnRequest {
            reason: "damaged".to_string(),
            items: vec![ReturnLineRequest {
                original_item_id: Uuid::new_v4(),
                quantity: 1,
            }],
        };
        assert!(request.validate().is_ok());
    }
}
