use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Wallet,
}

impl PaymentMethod {
    /// Cash settles at the drawer; card and wallet go through the gateway.
    pub fn requires_gateway(&self) -> bool {
        matches!(self, PaymentMethod::Card | PaymentMethod::Wallet)
    }
}

/// Who processed the payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    /// Settled internally (cash at the drawer).
    Internal,
    /// Settled through the external payment gateway.
    Gateway,
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Initiated,
    Success,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a payment against an order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub company_id: Uuid,
    pub store_id: Uuid,
    pub shift_id: Option<Uuid>,
    pub processed_by: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub provider: PaymentProvider,
    pub status: PaymentStatus,
    pub provider_ref: Option<String>,
    pub provider_data: Option<serde_json::Value>,
    pub failure_reason: Option<String>,
    pub customer_ref: Option<String>,
    pub notes: Option<String>,
    pub refunded_by: Option<Uuid>,
    pub refund_amount: Option<Decimal>,
    pub refund_reason: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for taking a payment against a PENDING order.
///
/// Amount is optional: when omitted the remaining balance is charged.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    pub method: PaymentMethod,
    pub amount: Option<Decimal>,
    pub customer_ref: Option<String>,
    pub notes: Option<String>,
}

/// Request DTO for refunding a successful payment.
///
/// Amount is optional: when omitted the full payment amount is refunded.
#[derive(Debug, Deserialize, Validate)]
pub struct RefundPaymentRequest {
    pub amount: Option<Decimal>,
    #[validate(length(min = 1, message = "Refund reason is required"))]
    pub reason: String,
}

/// Response DTO for payment creation. Gateway payments come back with a
/// redirect URL the terminal must follow; cash settles immediately.
#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    pub requires_action: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
}

/// Insert payload for a new payment row. The amount is not part of the
/// payload: it is resolved against the order's remaining balance inside the
/// insert transaction, under a lock on the order row.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: Uuid,
    pub company_id: Uuid,
    pub store_id: Uuid,
    pub shift_id: Option<Uuid>,
    pub processed_by: Uuid,
    pub currency: String,
    pub method: PaymentMethod,
    pub provider: PaymentProvider,
    pub status: PaymentStatus,
    pub customer_ref: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters for listing payments
#[derive(Debug, Default, Deserialize)]
pub struct GetPaymentsQuery {
    pub order_id: Option<Uuid>,
    pub shift_id: Option<Uuid>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Settlement position of one order
#[derive(Debug, Clone, Serialize)]
pub struct OrderPaymentSummary {
    pub order_id: Uuid,
    pub total_amount: Decimal,
    pub total_paid: Decimal,
    pub remaining: Decimal,
    pub fully_paid: bool,
}

/// Per-method totals over successful payments, for shift and store reporting
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentSummaryRow {
    pub method: PaymentMethod,
    pub count: i64,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_refund_request_carries_partial_amount() {
        // A requested partial amount must survive deserialization; dropping
        // it would turn a partial refund into a silent full refund.
        let request: RefundPaymentRequest =
            serde_json::from_str(r#"{"amount": "5.000", "reason": "partial return of damaged unit"}"#)
                .unwrap();
        assert_eq!(request.amount, Some(dec!(5.000)));
        assert_eq!(request.reason, "partial return of damaged unit");
    }

    #[test]
    fn test_refund_request_amount_defaults_to_none() {
        let request: RefundPaymentRequest =
            serde_json::from_str(r#"{"reason": "customer changed mind"}"#).unwrap();
        assert_eq!(request.amount, None);
    }
}
