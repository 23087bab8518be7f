//! Property-based tests for the purchase order state machine.
//!
//! - Received orders never move again
//! - Every non-received order can be cancelled
//! - Forward moves advance exactly one step

use proptest::prelude::*;

use super::types::PurchaseOrderStatus;

fn status() -> impl Strategy<Value = PurchaseOrderStatus> {
    prop::sample::select(PurchaseOrderStatus::ALL.to_vec())
}

fn rank(status: PurchaseOrderStatus) -> Option<usize> {
    [
        PurchaseOrderStatus::Draft,
        PurchaseOrderStatus::Pending,
        PurchaseOrderStatus::Approved,
        PurchaseOrderStatus::Ordered,
        PurchaseOrderStatus::Received,
    ]
    .iter()
    .position(|s| *s == status)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* target, a received order cannot transition.
    #[test]
    fn prop_received_is_terminal(next in status()) {
        prop_assert!(!PurchaseOrderStatus::Received.can_transition_to(next));
    }

    /// *For any* status other than Received, cancellation is allowed.
    #[test]
    fn prop_cancel_allowed_unless_received(from in status()) {
        prop_assert_eq!(
            from.can_transition_to(PurchaseOrderStatus::Cancelled),
            from != PurchaseOrderStatus::Received
        );
    }

    /// *For any* pair of lifecycle statuses, a move is allowed iff it is the
    /// next step.
    #[test]
    fn prop_forward_moves_are_single_steps(from in status(), next in status()) {
        if let (Some(a), Some(b)) = (rank(from), rank(next)) {
            prop_assert_eq!(from.can_transition_to(next), b == a + 1);
        }
    }

    /// *For any* walk of allowed transitions, a locked status is only left
    /// through a cancelled-to-cancelled no-op.
    #[test]
    fn prop_locked_statuses_stay_locked(walk in prop::collection::vec(status(), 1..12)) {
        let mut current = PurchaseOrderStatus::Draft;
        for next in walk {
            if current.can_transition_to(next) {
                if current.is_locked() {
                    prop_assert_eq!(current, PurchaseOrderStatus::Cancelled);
                    prop_assert_eq!(next, PurchaseOrderStatus::Cancelled);
                }
                current = next;
            }
        }
    }
}
