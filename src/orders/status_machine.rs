use crate::orders::OrderStatus;

/// Service for managing order status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Draft → Pending (confirm), Cancelled
    /// - Pending → Paid (full settlement), Cancelled
    /// - Paid → Pending (refund of a settling payment)
    /// - Cancelled → (terminal)
    /// - Any status → Same status (idempotent, tolerates webhook replay)
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        if from == to {
            return true;
        }

        match (from, to) {
            (OrderStatus::Draft, OrderStatus::Pending) => true,
            (OrderStatus::Draft, OrderStatus::Cancelled) => true,

            (OrderStatus::Pending, OrderStatus::Paid) => true,
            (OrderStatus::Pending, OrderStatus::Cancelled) => true,

            // A refunded payment drops the order below full settlement.
            (OrderStatus::Paid, OrderStatus::Pending) => true,

            (OrderStatus::Cancelled, _) => false,

            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_to_pending() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Draft,
            OrderStatus::Pending
        ));
    }

    #[test]
    fn test_draft_to_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Draft,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn test_pending_to_paid() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Paid
        ));
    }

    #[test]
    fn test_pending_to_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn test_paid_back_to_pending_on_refund() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Paid,
            OrderStatus::Pending
        ));
    }

    #[test]
    fn test_draft_cannot_skip_to_paid() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Draft,
            OrderStatus::Paid
        ));
    }

    #[test]
    fn test_paid_cannot_be_cancelled() {
        // Paid sales are reversed via RETURN/VOID orders, never cancelled.
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Paid,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn test_pending_cannot_go_back_to_draft() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Draft
        ));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Draft
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Paid
        ));
    }

    #[test]
    fn test_transition_valid() {
        let result = StatusMachine::transition(OrderStatus::Draft, OrderStatus::Pending);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), OrderStatus::Pending);
    }

    #[test]
    fn test_transition_invalid() {
        let result = StatusMachine::transition(OrderStatus::Draft, OrderStatus::Paid);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid status transition"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Draft),
            Just(OrderStatus::Pending),
            Just(OrderStatus::Paid),
            Just(OrderStatus::Cancelled),
        ]
    }

    /// Same-status transitions are always valid (idempotent)
    #[test]
    fn prop_same_status_is_valid() {
        proptest!(|(status in order_status_strategy())| {
            prop_assert!(StatusMachine::is_valid_transition(status, status));
        });
    }

    /// Cancelled is terminal: no way out
    #[test]
    fn prop_cancelled_is_terminal() {
        proptest!(|(to_status in order_status_strategy())| {
            if to_status != OrderStatus::Cancelled {
                prop_assert!(!StatusMachine::is_valid_transition(
                    OrderStatus::Cancelled,
                    to_status
                ));
            }
        });
    }

    /// transition() and is_valid_transition() agree everywhere
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(
            from in order_status_strategy(),
            to in order_status_strategy()
        )| {
            let is_valid = StatusMachine::is_valid_transition(from, to);
            let transition_result = StatusMachine::transition(from, to);

            if is_valid {
                prop_assert!(transition_result.is_ok());
                prop_assert_eq!(transition_result.unwrap(), to);
            } else {
                prop_assert!(transition_result.is_err());
            }
        });
    }
}
