use crate::payments::models::PaymentStatus;

/// Service for managing payment status transitions
pub struct PaymentStatusMachine;

impl PaymentStatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Initiated → Success, Failed
    /// - Success → Refunded
    /// - Failed → (terminal)
    /// - Refunded → (terminal)
    /// - Any status → Same status (idempotent, tolerates webhook replay)
    pub fn is_valid_transition(from: PaymentStatus, to: PaymentStatus) -> bool {
        if from == to {
            return true;
        }

        match (from, to) {
            (PaymentStatus::Initiated, PaymentStatus::Success) => true,
            (PaymentStatus::Initiated, PaymentStatus::Failed) => true,
            (PaymentStatus::Success, PaymentStatus::Refunded) => true,
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    pub fn transition(from: PaymentStatus, to: PaymentStatus) -> Result<PaymentStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid payment transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initiated_to_success() {
        assert!(PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Initiated,
            PaymentStatus::Success
        ));
    }

    #[test]
    fn test_initiated_to_failed() {
        assert!(PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Initiated,
            PaymentStatus::Failed
        ));
    }

    #[test]
    fn test_success_to_refunded() {
        assert!(PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Success,
            PaymentStatus::Refunded
        ));
    }

    #[test]
    fn test_failed_cannot_become_success() {
        // A failed charge stays failed; retries create a new payment.
        assert!(!PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Failed,
            PaymentStatus::Success
        ));
    }

    #[test]
    fn test_initiated_cannot_skip_to_refunded() {
        assert!(!PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Initiated,
            PaymentStatus::Refunded
        ));
    }

    #[test]
    fn test_refunded_is_terminal() {
        assert!(!PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Refunded,
            PaymentStatus::Success
        ));
        assert!(!PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Refunded,
            PaymentStatus::Initiated
        ));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn payment_status_strategy() -> impl Strategy<Value = PaymentStatus> {
        prop_oneof![
            Just(PaymentStatus::Initiated),
            Just(PaymentStatus::Success),
            Just(PaymentStatus::Failed),
            Just(PaymentStatus::Refunded),
        ]
    }

    /// Webhook replays deliver the same status twice; that is always valid
    #[test]
    fn prop_same_status_is_valid() {
        proptest!(|(status in payment_status_strategy())| {
            prop_assert!(PaymentStatusMachine::is_valid_transition(status, status));
        });
    }

    /// Failed and Refunded are terminal
    #[test]
    fn prop_terminal_states_have_no_exit() {
        proptest!(|(to in payment_status_strategy())| {
            for terminal in [PaymentStatus::Failed, PaymentStatus::Refunded] {
                if to != terminal {
                    prop_assert!(!PaymentStatusMachine::is_valid_transition(terminal, to));
                }
            }
        });
    }

    /// transition() and is_valid_transition() agree everywhere
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(
            from in payment_status_strategy(),
            to in payment_status_strategy()
        )| {
            let is_valid = PaymentStatusMachine::is_valid_transition(from, to);
            let result = PaymentStatusMachine::transition(from, to);
            if is_valid {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(result.is_err());
            }
        });
    }
}
