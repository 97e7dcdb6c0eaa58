//! Property-based tests for WorkflowService.
//!
//! These tests check the entry state machine against randomized statuses
//! and actors using proptest.

use proptest::prelude::*;
use snel_shared::types::UserId;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Strategy for generating random EntryStatus values.
fn arb_status() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::Pending),
        Just(EntryStatus::Posted),
        Just(EntryStatus::Declined),
        Just(EntryStatus::Reversed),
    ]
}

/// Strategy for generating random user ids.
fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating non-blank reasons.
fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,20}( [a-zA-Z0-9]{1,20}){0,4}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Valid transitions carry their audit fields
    // =========================================================================

    /// Pending + approve → Posted, recording the approver.
    #[test]
    fn prop_approve_from_pending_succeeds(user in arb_user()) {
        let action = WorkflowService::approve(EntryStatus::Pending, user).unwrap();
        prop_assert_eq!(action.new_status(), EntryStatus::Posted);
        prop_assert_eq!(action.expected_status(), EntryStatus::Pending);
        if let WorkflowAction::Approve { approved_by, .. } = action {
            prop_assert_eq!(approved_by, user);
        } else {
            prop_assert!(false, "Expected Approve action");
        }
    }

    /// Pending + decline → Declined, recording the decliner.
    #[test]
    fn prop_decline_from_pending_succeeds(user in arb_user()) {
        let action = WorkflowService::decline(EntryStatus::Pending, user).unwrap();
        prop_assert_eq!(action.new_status(), EntryStatus::Declined);
        prop_assert_eq!(action.actor(), user);
    }

    /// Posted + reverse → Reversed, keeping the reason.
    #[test]
    fn prop_reverse_from_posted_succeeds(user in arb_user(), reason in arb_reason()) {
        let action = WorkflowService::reverse(EntryStatus::Posted, user, reason.clone()).unwrap();
        prop_assert_eq!(action.new_status(), EntryStatus::Reversed);
        if let WorkflowAction::Reverse { reason: kept, reversed_by, .. } = action {
            prop_assert_eq!(kept, reason);
            prop_assert_eq!(reversed_by, user);
        } else {
            prop_assert!(false, "Expected Reverse action");
        }
    }

    // =========================================================================
    // Invalid transitions are rejected with the observed status
    // =========================================================================

    /// Approve from anything but Pending fails.
    #[test]
    fn prop_approve_from_non_pending_fails(status in arb_status(), user in arb_user()) {
        prop_assume!(status != EntryStatus::Pending);
        prop_assert_eq!(
            WorkflowService::approve(status, user),
            Err(WorkflowError::InvalidTransition { from: status, to: EntryStatus::Posted })
        );
    }

    /// Decline from anything but Pending fails.
    #[test]
    fn prop_decline_from_non_pending_fails(status in arb_status(), user in arb_user()) {
        prop_assume!(status != EntryStatus::Pending);
        prop_assert_eq!(
            WorkflowService::decline(status, user),
            Err(WorkflowError::InvalidTransition { from: status, to: EntryStatus::Declined })
        );
    }

    /// Reverse from anything but Posted fails.
    #[test]
    fn prop_reverse_from_non_posted_fails(
        status in arb_status(),
        user in arb_user(),
        reason in arb_reason(),
    ) {
        prop_assume!(status != EntryStatus::Posted);
        let is_invalid_transition = matches!(
            WorkflowService::reverse(status, user, reason),
            Err(WorkflowError::InvalidTransition { .. })
        );
        prop_assert!(is_invalid_transition);
    }

    // =========================================================================
    // The service and the transition table agree
    // =========================================================================

    /// Every action the service produces is a valid transition.
    #[test]
    fn prop_actions_match_transition_table(status in arb_status(), user in arb_user()) {
        for action in [
            WorkflowService::approve(status, user),
            WorkflowService::decline(status, user),
            WorkflowService::reverse(status, user, "audit".to_string()),
        ]
        .into_iter()
        .flatten()
        {
            prop_assert!(WorkflowService::is_valid_transition(status, action.new_status()));
        }
    }

    /// Terminal states admit no transition at all.
    #[test]
    fn prop_terminal_states_are_final(status in arb_status(), target in arb_status()) {
        if status.is_terminal() {
            prop_assert!(!WorkflowService::is_valid_transition(status, target));
        }
    }
}
