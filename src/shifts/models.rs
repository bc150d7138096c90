use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Shift status: a drawer is either open or closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Open,
    Closed,
}

/// Cash drawer session for one cashier in one store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CashShift {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub store_id: Uuid,
    pub status: ShiftStatus,
    pub opening_cash: Decimal,
    pub closing_cash: Option<Decimal>,
    pub expected_cash: Option<Decimal>,
    pub difference: Option<Decimal>,
    pub opening_notes: Option<String>,
    pub closing_notes: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Request DTO for opening a shift
#[derive(Debug, Deserialize, Validate)]
pub struct OpenShiftRequest {
    pub opening_cash: Decimal,
    pub notes: Option<String>,
}

/// Request DTO for closing a shift with the counted drawer amount
#[derive(Debug, Deserialize, Validate)]
pub struct CloseShiftRequest {
    pub closing_cash: Decimal,
    pub notes: Option<String>,
}

/// Reconciliation outcome relative to the expected drawer amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationStatus {
    Balanced,
    Excess,
    Short,
}

/// Computed drawer reconciliation at close time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub expected_cash: Decimal,
    pub difference: Decimal,
    pub status: ReconciliationStatus,
}

impl Reconciliation {
    /// Expected cash is opening float plus successful cash payments taken
    /// during the shift. Difference is counted minus expected: positive
    /// means excess in the drawer, negative means short.
    pub fn compute(opening_cash: Decimal, cash_payments: Decimal, closing_cash: Decimal) -> Self {
        let expected_cash = opening_cash + cash_payments;
        let difference = closing_cash - expected_cash;

        let status = if difference.is_zero() {
            ReconciliationStatus::Balanced
        } else if difference > Decimal::ZERO {
            ReconciliationStatus::Excess
        } else {
            ReconciliationStatus::Short
        };

        Self {
            expected_cash,
            difference,
            status,
        }
    }
}

/// Response DTO for a closed shift with its reconciliation
#[derive(Debug, Serialize)]
pub struct CloseShiftResponse {
    #[serde(flatten)]
    pub shift: CashShift,
    pub reconciliation_status: ReconciliationStatus,
}

/// Read DTO for a single shift. Closed shifts carry the reconciliation
/// status derived from their persisted difference.
#[derive(Debug, Serialize)]
pub struct ShiftResponse {
    #[serde(flatten)]
    pub shift: CashShift,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation_status: Option<ReconciliationStatus>,
}

/// Query parameters for listing shifts
#[derive(Debug, Default, Deserialize)]
pub struct GetShiftsQuery {
    pub status: Option<ShiftStatus>,
    pub store_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reconciliation_balanced() {
        // Opened with 100, took 25 in cash, counted 125.
        let rec = Reconciliation::compute(dec!(100), dec!(25), dec!(125));
        assert_eq!(rec.expected_cash, dec!(125));
        assert_eq!(rec.difference, Decimal::ZERO);
        assert_eq!(rec.status, ReconciliationStatus::Balanced);
    }

    #[test]
    fn test_reconciliation_excess() {
        let rec = Reconciliation::compute(dec!(100), dec!(25), dec!(130));
        assert_eq!(rec.difference, dec!(5));
        assert_eq!(rec.status, ReconciliationStatus::Excess);
    }

    #[test]
    fn test_reconciliation_short() {
        let rec = Reconciliation::compute(dec!(100), dec!(25), dec!(120));
        assert_eq!(rec.difference, dec!(-5));
        assert_eq!(rec.status, ReconciliationStatus::Short);
    }

    #[test]
    fn test_reconciliation_no_cash_sales() {
        let rec = Reconciliation::compute(dec!(50.000), Decimal::ZERO, dec!(50.000));
        assert_eq!(rec.expected_cash, dec!(50.000));
        assert_eq!(rec.status, ReconciliationStatus::Balanced);
    }

    #[test]
    fn test_reconciliation_refunds_reduce_expected() {
        // Cash refunds during the shift net against cash taken.
        let rec = Reconciliation::compute(dec!(100), dec!(-10), dec!(90));
        assert_eq!(rec.expected_cash, dec!(90));
        assert_eq!(rec.status, ReconciliationStatus::Balanced);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_amount() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000).prop_map(|mils| Decimal::new(mils, 3))
    }

    /// Counting exactly the expected amount always balances
    #[test]
    fn prop_exact_count_balances() {
        proptest!(|(opening in arb_amount(), cash in arb_amount())| {
            let rec = Reconciliation::compute(opening, cash, opening + cash);
            prop_assert_eq!(rec.status, ReconciliationStatus::Balanced);
            prop_assert_eq!(rec.difference, Decimal::ZERO);
        });
    }

    /// Status always agrees with the sign of the difference
    #[test]
    fn prop_status_matches_difference_sign() {
        proptest!(|(opening in arb_amount(), cash in arb_amount(), counted in arb_amount())| {
            let rec = Reconciliation::compute(opening, cash, counted);
            match rec.status {
                ReconciliationStatus::Balanced => prop_assert!(rec.difference.is_zero()),
                ReconciliationStatus::Excess => prop_assert!(rec.difference > Decimal::ZERO),
                ReconciliationStatus::Short => prop_assert!(rec.difference < Decimal::ZERO),
            }
        });
    }
}
