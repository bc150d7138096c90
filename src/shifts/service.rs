use rust_decimal::Decimal;
use uuid::Uuid;

use crate::auth::{ActorContext, Visibility};
use crate::shifts::error::ShiftError;
use crate::shifts::models::{
    CashShift, CloseShiftRequest, CloseShiftResponse, GetShiftsQuery, OpenShiftRequest,
    Reconciliation, ReconciliationStatus, ShiftStatus,
};
use crate::shifts::repository::ShiftsRepository;

/// Service for cash drawer sessions and reconciliation
#[derive(Clone)]
pub struct ShiftService {
    repository: ShiftsRepository,
}

impl ShiftService {
    pub fn new(repository: ShiftsRepository) -> Self {
        Self { repository }
    }

    /// Open a shift for the acting cashier. The database enforces the
    /// one-open-shift rule; a duplicate open comes back as Conflict.
    pub async fn open(
        &self,
        request: OpenShiftRequest,
        actor: &ActorContext,
    ) -> Result<CashShift, ShiftError> {
        let store_id = actor.store_id.ok_or_else(|| {
            ShiftError::ValidationFailed("Actor is not assigned to a store".to_string())
        })?;

        if request.opening_cash < Decimal::ZERO {
            return Err(ShiftError::ValidationFailed(
                "Opening cash cannot be negative".to_string(),
            ));
        }

        let shift = self
            .repository
            .create(
                actor.user_id,
                actor.company_id,
                store_id,
                request.opening_cash,
                request.notes,
            )
            .await?;

        tracing::info!(
            "Shift {} opened by {} with {} float",
            shift.id,
            actor.user_id,
            shift.opening_cash
        );
        Ok(shift)
    }

    /// Close the acting cashier's open shift, reconciling the counted
    /// drawer amount against opening float plus net cash payments.
    pub async fn close(
        &self,
        request: CloseShiftRequest,
        actor: &ActorContext,
    ) -> Result<CloseShiftResponse, ShiftError> {
        let store_id = actor.store_id.ok_or_else(|| {
            ShiftError::ValidationFailed("Actor is not assigned to a store".to_string())
        })?;

        if request.closing_cash < Decimal::ZERO {
            return Err(ShiftError::ValidationFailed(
                "Closing cash cannot be negative".to_string(),
            ));
        }

        let open = self
            .repository
            .find_open(actor.user_id, store_id)
            .await?
            .ok_or(ShiftError::NoOpenShift)?;

        let cash_total = self.repository.cash_payments_total(open.id).await?;
        let reconciliation =
            Reconciliation::compute(open.opening_cash, cash_total, request.closing_cash);

        let shift = self
            .repository
            .close(open.id, request.closing_cash, reconciliation, request.notes)
            .await?
            .ok_or_else(|| {
                ShiftError::InvalidState("Shift was already closed".to_string())
            })?;

        tracing::info!(
            "Shift {} closed: expected {}, counted {}, difference {}",
            shift.id,
            reconciliation.expected_cash,
            request.closing_cash,
            reconciliation.difference
        );

        Ok(CloseShiftResponse {
            shift,
            reconciliation_status: reconciliation.status,
        })
    }

    /// The acting cashier's open shift, if any
    pub async fn current_shift(
        &self,
        actor: &ActorContext,
    ) -> Result<Option<CashShift>, ShiftError> {
        let Some(store_id) = actor.store_id else {
            return Ok(None);
        };
        self.repository.find_open(actor.user_id, store_id).await
    }

    /// Convenience for other services: id of the open shift, if any
    pub async fn open_shift_id(&self, actor: &ActorContext) -> Result<Option<Uuid>, ShiftError> {
        Ok(self.current_shift(actor).await?.map(|s| s.id))
    }

    /// Cash payments require an open shift to post into; returns its id.
    pub async fn validate_cash_shift(&self, actor: &ActorContext) -> Result<Uuid, ShiftError> {
        self.open_shift_id(actor)
            .await?
            .ok_or(ShiftError::NoOpenShift)
    }

    pub async fn get_shift(
        &self,
        shift_id: Uuid,
        actor: &ActorContext,
    ) -> Result<CashShift, ShiftError> {
        let shift = self
            .repository
            .find_by_id(shift_id)
            .await?
            .ok_or(ShiftError::NotFound)?;

        let allowed = match actor.visibility() {
            Visibility::Own => shift.user_id == actor.user_id,
            Visibility::Store => actor.store_id == Some(shift.store_id),
            Visibility::Company => shift.company_id == actor.company_id,
            Visibility::All => true,
        };
        if !allowed {
            return Err(ShiftError::AccessDenied);
        }

        Ok(shift)
    }

    /// List shifts; the actor's visibility narrows the scope before query
    /// filters apply.
    pub async fn list_shifts(
        &self,
        query: GetShiftsQuery,
        actor: &ActorContext,
    ) -> Result<Vec<CashShift>, ShiftError> {
        let (scope_user, scope_store) = match actor.visibility() {
            Visibility::Own => (Some(actor.user_id), None),
            Visibility::Store => {
                let store_id = actor.store_id.ok_or(ShiftError::AccessDenied)?;
                (None, Some(store_id))
            }
            Visibility::Company | Visibility::All => (None, None),
        };

        self.repository
            .list(actor.company_id, &query, scope_user, scope_store)
            .await
    }

    /// Reconciliation status for an already-closed shift, derived from the
    /// persisted difference.
    pub fn reconciliation_status(shift: &CashShift) -> Option<ReconciliationStatus> {
        if shift.status != ShiftStatus::Closed {
            return None;
        }
        let difference = shift.difference?;
        Some(if difference.is_zero() {
            ReconciliationStatus::Balanced
        } else if difference > Decimal::ZERO {
            ReconciliationStatus::Excess
        } else {
            ReconciliationStatus::Short
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn closed_shift(difference: Option<Decimal>) -> CashShift {
        CashShift {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            status: ShiftStatus::Closed,
            opening_cash: dec!(100),
            closing_cash: Some(dec!(125)),
            expected_cash: Some(dec!(125)),
            difference,
            opening_notes: None,
            closing_notes: None,
            opened_at: Utc::now(),
            closed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_open_shift_has_no_reconciliation_status() {
        let mut shift = closed_shift(None);
        shift.status = ShiftStatus::Open;
        shift.closing_cash = None;
        shift.expected_cash = None;
        shift.closed_at = None;
        assert_eq!(ShiftService::reconciliation_status(&shift), None);
    }

    #[test]
    fn test_closed_shift_status_follows_difference_sign() {
        assert_eq!(
            ShiftService::reconciliation_status(&closed_shift(Some(Decimal::ZERO))),
            Some(ReconciliationStatus::Balanced)
        );
        assert_eq!(
            ShiftService::reconciliation_status(&closed_shift(Some(dec!(5)))),
            Some(ReconciliationStatus::Excess)
        );
        assert_eq!(
            ShiftService::reconciliation_status(&closed_shift(Some(dec!(-5)))),
            Some(ReconciliationStatus::Short)
        );
    }
}
