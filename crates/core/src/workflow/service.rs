//! Workflow service for entry state transitions.
//!
//! This module implements the pure state machine. Persistence applies the
//! returned action with a compare-and-swap on `expected_status`, so the
//! check made here is repeated atomically at commit time.

use chrono::Utc;
use snel_shared::types::UserId;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Stateless service for managing entry workflow transitions.
///
/// All methods are associated functions that validate a transition and
/// return the `WorkflowAction` carrying its audit trail.
pub struct WorkflowService;

impl WorkflowService {
    /// Approve a pending entry.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Approve)` if the entry is pending
    /// * `Err(WorkflowError::InvalidTransition)` otherwise
    pub fn approve(
        current_status: EntryStatus,
        approved_by: UserId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            EntryStatus::Pending => Ok(WorkflowAction::Approve {
                expected: EntryStatus::Pending,
                new_status: EntryStatus::Posted,
                approved_by,
                approved_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: EntryStatus::Posted,
            }),
        }
    }

    /// Decline a pending entry.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Decline)` if the entry is pending
    /// * `Err(WorkflowError::InvalidTransition)` otherwise
    pub fn decline(
        current_status: EntryStatus,
        declined_by: UserId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            EntryStatus::Pending => Ok(WorkflowAction::Decline {
                expected: EntryStatus::Pending,
                new_status: EntryStatus::Declined,
                declined_by,
                declined_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: EntryStatus::Declined,
            }),
        }
    }

    /// Reverse a posted entry.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Reverse)` if the entry is posted
    /// * `Err(WorkflowError::InvalidTransition)` if not in Posted status
    /// * `Err(WorkflowError::ReversalReasonRequired)` if reason is empty
    pub fn reverse(
        current_status: EntryStatus,
        reversed_by: UserId,
        reason: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::ReversalReasonRequired);
        }

        match current_status {
            EntryStatus::Posted => Ok(WorkflowAction::Reverse {
                expected: EntryStatus::Posted,
                new_status: EntryStatus::Reversed,
                reversed_by,
                reversed_at: Utc::now(),
                reason,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: EntryStatus::Reversed,
            }),
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Posted (approve)
    /// - Pending → Declined (decline)
    /// - Posted → Reversed (reverse)
    #[must_use]
    pub fn is_valid_transition(from: EntryStatus, to: EntryStatus) -> bool {
        matches!(
            (from, to),
            (EntryStatus::Pending, EntryStatus::Posted | EntryStatus::Declined)
                | (EntryStatus::Posted, EntryStatus::Reversed)
        )
    }
}
