use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::payments::error::PaymentError;
use crate::payments::models::{
    GetPaymentsQuery, NewPayment, Payment, PaymentStatus, PaymentSummaryRow,
};

/// A set of payments covers an order when their sum reaches the order total
/// in magnitude. Reversal orders have negative totals and negative payment
/// amounts, so the comparison is on absolute values.
pub fn covers_total(paid: Decimal, total: Decimal) -> bool {
    paid.abs() >= total.abs()
}

/// Resolve the signed amount for a new payment against the order's state.
///
/// The requested amount (if any) is a positive magnitude; the result carries
/// the order's sign, so reversal orders get negative settlement amounts.
/// Evaluated under the order row lock so no two payments can both claim the
/// same remaining balance.
fn resolve_charge_amount(
    total_amount: Decimal,
    paid: Decimal,
    requested: Option<Decimal>,
) -> Result<Decimal, PaymentError> {
    let remaining = total_amount.abs() - paid.abs();
    if remaining <= Decimal::ZERO {
        return Err(PaymentError::InvalidState(
            "Order is already fully paid".to_string(),
        ));
    }

    let magnitude = match requested {
        Some(amount) => {
            if amount <= Decimal::ZERO {
                return Err(PaymentError::ValidationFailed(
                    "Payment amount must be positive".to_string(),
                ));
            }
            if amount > remaining {
                return Err(PaymentError::ValidationFailed(format!(
                    "Payment of {} exceeds remaining balance of {}",
                    amount, remaining
                )));
            }
            amount
        }
        None => remaining,
    };

    Ok(if total_amount < Decimal::ZERO {
        -magnitude
    } else {
        magnitude
    })
}

/// Resolve the magnitude to refund from a payment.
///
/// The requested amount (if any) is a positive magnitude and may not exceed
/// what the payment actually took; omitted means a full refund.
pub fn resolve_refund_amount(
    payment_amount: Decimal,
    requested: Option<Decimal>,
) -> Result<Decimal, PaymentError> {
    let charged = payment_amount.abs();
    match requested {
        Some(amount) => {
            if amount <= Decimal::ZERO {
                return Err(PaymentError::ValidationFailed(
                    "Refund amount must be positive".to_string(),
                ));
            }
            if amount > charged {
                return Err(PaymentError::ValidationFailed(format!(
                    "Refund of {} exceeds the payment amount of {}",
                    amount, charged
                )));
            }
            Ok(amount)
        }
        None => Ok(charged),
    }
}

const PAYMENT_COLUMNS: &str = "id, order_id, company_id, store_id, shift_id, processed_by, \
     amount, currency, method, provider, status, provider_ref, provider_data, failure_reason, \
     customer_ref, notes, refunded_by, refund_amount, refund_reason, refunded_at, \
     created_at, updated_at";

/// Repository for payment data access
#[derive(Clone)]
pub struct PaymentsRepository {
    pool: PgPool,
}

impl PaymentsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a payment with its amount resolved against the order's
    /// remaining balance, all inside one transaction with the order row
    /// locked. Concurrent payments for the same order serialize on the
    /// lock, so they cannot both claim the full remaining balance.
    pub async fn create_guarded(
        &self,
        new: NewPayment,
        requested: Option<Decimal>,
    ) -> Result<Payment, PaymentError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String, Decimal)> = sqlx::query_as(
            "SELECT status, total_amount FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(new.order_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((status, total_amount)) = row else {
            tx.rollback().await?;
            return Err(PaymentError::OrderNotFound);
        };
        if status != "pending" {
            tx.rollback().await?;
            return Err(PaymentError::InvalidState(
                "Payments can only be taken against PENDING orders".to_string(),
            ));
        }

        let paid: Option<Decimal> = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments \
             WHERE order_id = $1 AND status = 'success'",
        )
        .bind(new.order_id)
        .fetch_one(&mut *tx)
        .await?;
        let paid = paid.unwrap_or(Decimal::ZERO);

        let amount = match resolve_charge_amount(total_amount, paid, requested) {
            Ok(amount) => amount,
            Err(err) => {
                tx.rollback().await?;
                return Err(err);
            }
        };

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (order_id, company_id, store_id, shift_id, processed_by,
                                  amount, currency, method, provider, status, customer_ref, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(new.order_id)
        .bind(new.company_id)
        .bind(new.store_id)
        .bind(new.shift_id)
        .bind(new.processed_by)
        .bind(amount)
        .bind(new.currency)
        .bind(new.method)
        .bind(new.provider)
        .bind(new.status)
        .bind(new.customer_ref)
        .bind(new.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(payment)
    }

    pub async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, PaymentError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn find_by_provider_ref(
        &self,
        provider_ref: &str,
    ) -> Result<Option<Payment>, PaymentError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE provider_ref = $1"
        ))
        .bind(provider_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn find_by_order(&self, order_id: Uuid) -> Result<Vec<Payment>, PaymentError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 ORDER BY created_at"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn set_provider_ref(
        &self,
        payment_id: Uuid,
        provider_ref: &str,
        provider_data: &Value,
    ) -> Result<Payment, PaymentError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET provider_ref = $2, provider_data = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(provider_ref)
        .bind(provider_data)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Conditional status transition. Only moves the row when it is still in
    /// `from`, so webhook replays and racing updates become no-ops.
    pub async fn transition_status(
        &self,
        payment_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        failure_reason: Option<&str>,
        provider_data: Option<&Value>,
    ) -> Result<Option<Payment>, PaymentError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = $3,
                failure_reason = COALESCE($4, failure_reason),
                provider_data = COALESCE($5, provider_data),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(from)
        .bind(to)
        .bind(failure_reason)
        .bind(provider_data)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Mark a successful payment refunded, recording who, why and how much.
    /// Conditional on status still being success.
    pub async fn mark_refunded(
        &self,
        payment_id: Uuid,
        refunded_by: Uuid,
        refund_amount: Decimal,
        reason: &str,
    ) -> Result<Option<Payment>, PaymentError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'refunded',
                refunded_by = $2,
                refund_amount = $3,
                refund_reason = $4,
                refunded_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'success'
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(refunded_by)
        .bind(refund_amount)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Sum of successful payments against an order
    pub async fn total_paid(&self, order_id: Uuid) -> Result<Decimal, PaymentError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments \
             WHERE order_id = $1 AND status = 'success'",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    /// Settle the order when successful payments cover its absolute total.
    ///
    /// Locks the order row, re-reads the paid sum inside the transaction and
    /// flips PENDING to PAID in one conditional UPDATE. Two webhooks racing
    /// for the same order serialize on the row lock; whichever runs second
    /// sees the order already PAID and returns false.
    pub async fn settle_order_if_covered(&self, order_id: Uuid) -> Result<bool, PaymentError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String, Decimal)> = sqlx::query_as(
            "SELECT status, total_amount FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((status, total_amount)) = row else {
            tx.rollback().await?;
            return Err(PaymentError::OrderNotFound);
        };
        if status != "pending" {
            tx.rollback().await?;
            return Ok(false);
        }

        let paid: Option<Decimal> = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments \
             WHERE order_id = $1 AND status = 'success'",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;
        let paid = paid.unwrap_or(Decimal::ZERO);

        if !covers_total(paid, total_amount) {
            tx.rollback().await?;
            return Ok(false);
        }

        let updated = sqlx::query(
            "UPDATE orders SET status = 'paid', updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated.rows_affected() == 1)
    }

    /// Drop a PAID order back to PENDING after a refund removed part of its
    /// settlement. Conditional, so a concurrent refund does this only once.
    pub async fn revert_order_to_pending(&self, order_id: Uuid) -> Result<bool, PaymentError> {
        let updated = sqlx::query(
            "UPDATE orders SET status = 'pending', updated_at = NOW() \
             WHERE id = $1 AND status = 'paid'",
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(updated.rows_affected() == 1)
    }

    pub async fn list(
        &self,
        company_id: Uuid,
        query: &GetPaymentsQuery,
        scope_user: Option<Uuid>,
        scope_store: Option<Uuid>,
    ) -> Result<Vec<Payment>, PaymentError> {
        let mut builder = sqlx::QueryBuilder::new(format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE company_id = "
        ));
        builder.push_bind(company_id);

        if let Some(user_id) = scope_user {
            builder.push(" AND processed_by = ");
            builder.push_bind(user_id);
        }
        if let Some(store_id) = scope_store {
            builder.push(" AND store_id = ");
            builder.push_bind(store_id);
        }
        if let Some(order_id) = query.order_id {
            builder.push(" AND order_id = ");
            builder.push_bind(order_id);
        }
        if let Some(shift_id) = query.shift_id {
            builder.push(" AND shift_id = ");
            builder.push_bind(shift_id);
        }
        if let Some(method) = query.method {
            builder.push(" AND method = ");
            builder.push_bind(method);
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
        if let Some(from) = query.from {
            builder.push(" AND created_at >= ");
            builder.push_bind(from);
        }
        if let Some(to) = query.to {
            builder.push(" AND created_at <= ");
            builder.push_bind(to);
        }

        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind((page - 1) * limit);

        let payments = builder
            .build_query_as::<Payment>()
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// Per-method totals over successful payments in a shift
    pub async fn shift_summary(
        &self,
        shift_id: Uuid,
    ) -> Result<Vec<PaymentSummaryRow>, PaymentError> {
        let rows = sqlx::query_as::<_, PaymentSummaryRow>(
            r#"
            SELECT method, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total
            FROM payments
            WHERE shift_id = $1 AND status = 'success'
            GROUP BY method
            ORDER BY method
            "#,
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exact_payment_covers_total() {
        assert!(covers_total(dec!(29.500), dec!(29.500)));
    }

    #[test]
    fn test_partial_payment_does_not_cover() {
        assert!(!covers_total(dec!(29.499), dec!(29.500)));
        assert!(!covers_total(Decimal::ZERO, dec!(0.001)));
    }

    #[test]
    fn test_overpayment_covers() {
        assert!(covers_total(dec!(30), dec!(29.500)));
    }

    #[test]
    fn test_reversal_order_covered_by_negative_payments() {
        // A RETURN order totalling -21 settles with a -21 cash refund.
        assert!(covers_total(dec!(-21), dec!(-21)));
        assert!(!covers_total(dec!(-20), dec!(-21)));
    }

    #[test]
    fn test_zero_total_is_trivially_covered() {
        assert!(covers_total(Decimal::ZERO, Decimal::ZERO));
    }

    #[test]
    fn test_charge_defaults_to_remaining_balance() {
        let amount = resolve_charge_amount(dec!(29.500), dec!(10.000), None).unwrap();
        assert_eq!(amount, dec!(19.500));
    }

    #[test]
    fn test_charge_cannot_exceed_remaining_balance() {
        // Once one payment has claimed the full balance, a second attempt
        // sees zero remaining and is rejected rather than double-charging.
        let full = resolve_charge_amount(dec!(29.500), Decimal::ZERO, None).unwrap();
        assert_eq!(full, dec!(29.500));
        let second = resolve_charge_amount(dec!(29.500), full, None);
        assert!(matches!(second, Err(PaymentError::InvalidState(_))));
    }

    #[test]
    fn test_partial_charge_over_remaining_rejected() {
        let result = resolve_charge_amount(dec!(29.500), dec!(20.000), Some(dec!(10.000)));
        assert!(matches!(result, Err(PaymentError::ValidationFailed(_))));
    }

    #[test]
    fn test_charge_amount_must_be_positive() {
        let result = resolve_charge_amount(dec!(29.500), Decimal::ZERO, Some(Decimal::ZERO));
        assert!(matches!(result, Err(PaymentError::ValidationFailed(_))));
    }

    #[test]
    fn test_refund_defaults_to_full_payment_amount() {
        assert_eq!(resolve_refund_amount(dec!(29.500), None).unwrap(), dec!(29.500));
        // Negative cash settlements refund by magnitude.
        assert_eq!(resolve_refund_amount(dec!(-21.000), None).unwrap(), dec!(21.000));
    }

    #[test]
    fn test_partial_refund_amount_is_honoured() {
        // A requested partial amount must come through as-is, not be
        // silently widened to the full payment.
        assert_eq!(
            resolve_refund_amount(dec!(29.500), Some(dec!(5.000))).unwrap(),
            dec!(5.000)
        );
    }

    #[test]
    fn test_refund_cannot_exceed_payment() {
        let result = resolve_refund_amount(dec!(29.500), Some(dec!(29.501)));
        assert!(matches!(result, Err(PaymentError::ValidationFailed(_))));
    }

    #[test]
    fn test_refund_amount_must_be_positive() {
        let result = resolve_refund_amount(dec!(29.500), Some(Decimal::ZERO));
        assert!(matches!(result, Err(PaymentError::ValidationFailed(_))));
        let result = resolve_refund_amount(dec!(29.500), Some(dec!(-1)));
        assert!(matches!(result, Err(PaymentError::ValidationFailed(_))));
    }

    #[test]
    fn test_reversal_order_charges_carry_negative_sign() {
        let amount = resolve_charge_amount(dec!(-21.000), Decimal::ZERO, None).unwrap();
        assert_eq!(amount, dec!(-21.000));
        // A partial settlement on a reversal is negative too.
        let partial = resolve_charge_amount(dec!(-21.000), Decimal::ZERO, Some(dec!(10))).unwrap();
        assert_eq!(partial, dec!(-10));
    }
}
