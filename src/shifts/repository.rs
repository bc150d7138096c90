use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::shifts::error::ShiftError;
use crate::shifts::models::{CashShift, GetShiftsQuery, Reconciliation, ShiftStatus};

const SHIFT_COLUMNS: &str = "id, user_id, company_id, store_id, status, opening_cash, \
     closing_cash, expected_cash, difference, opening_notes, closing_notes, opened_at, closed_at";

/// Repository for cash shift data access
#[derive(Clone)]
pub struct ShiftsRepository {
    pool: PgPool,
}

impl ShiftsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new open shift. A partial unique index allows at most one
    /// open shift per (user, store); a violation surfaces as Conflict
    /// instead of a generic database error.
    pub async fn create(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        store_id: Uuid,
        opening_cash: Decimal,
        notes: Option<String>,
    ) -> Result<CashShift, ShiftError> {
        let result = sqlx::query_as::<_, CashShift>(&format!(
            r#"
            INSERT INTO cash_shifts (user_id, company_id, store_id, opening_cash, opening_notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(company_id)
        .bind(store_id)
        .bind(opening_cash)
        .bind(notes)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(shift) => Ok(shift),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                Err(ShiftError::Conflict(
                    "An open shift already exists for this cashier".to_string(),
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_id(&self, shift_id: Uuid) -> Result<Option<CashShift>, ShiftError> {
        let shift = sqlx::query_as::<_, CashShift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM cash_shifts WHERE id = $1"
        ))
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    pub async fn find_open(
        &self,
        user_id: Uuid,
        store_id: Uuid,
    ) -> Result<Option<CashShift>, ShiftError> {
        let shift = sqlx::query_as::<_, CashShift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM cash_shifts \
             WHERE user_id = $1 AND store_id = $2 AND status = 'open'"
        ))
        .bind(user_id)
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Net cash taken during a shift: successful cash payments minus
    /// refunded ones. Reversal settlements recorded as negative-amount cash
    /// payments net out through the same SUM.
    pub async fn cash_payments_total(&self, shift_id: Uuid) -> Result<Decimal, ShiftError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM payments
            WHERE shift_id = $1 AND method = 'cash' AND status = 'success'
            "#,
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    /// Close a shift, persisting the counted amount and the reconciliation.
    /// Conditional on the shift still being open; returns `None` when it was
    /// already closed (e.g. by a concurrent close).
    pub async fn close(
        &self,
        shift_id: Uuid,
        closing_cash: Decimal,
        reconciliation: Reconciliation,
        notes: Option<String>,
    ) -> Result<Option<CashShift>, ShiftError> {
        let shift = sqlx::query_as::<_, CashShift>(&format!(
            r#"
            UPDATE cash_shifts
            SET status = 'closed',
                closing_cash = $2,
                expected_cash = $3,
                difference = $4,
                closing_notes = $5,
                closed_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(shift_id)
        .bind(closing_cash)
        .bind(reconciliation.expected_cash)
        .bind(reconciliation.difference)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    pub async fn list(
        &self,
        company_id: Uuid,
        query: &GetShiftsQuery,
        scope_user: Option<Uuid>,
        scope_store: Option<Uuid>,
    ) -> Result<Vec<CashShift>, ShiftError> {
        let mut builder = sqlx::QueryBuilder::new(format!(
            "SELECT {SHIFT_COLUMNS} FROM cash_shifts WHERE company_id = "
        ));
        builder.push_bind(company_id);

        if let Some(user_id) = scope_user.or(query.user_id) {
            builder.push(" AND user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(store_id) = scope_store.or(query.store_id) {
            builder.push(" AND store_id = ");
            builder.push_bind(store_id);
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }

        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        builder.push(" ORDER BY opened_at DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind((page - 1) * limit);

        let shifts = builder
            .build_query_as::<CashShift>()
            .fetch_all(&self.pool)
            .await?;

        Ok(shifts)
    }
}
