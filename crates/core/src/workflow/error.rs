//! Workflow error types for the entry lifecycle.

use thiserror::Error;

use crate::workflow::types::EntryStatus;

/// Errors raised by the pure state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: EntryStatus,
        /// The attempted target status.
        to: EntryStatus,
    },

    /// Reversal reason is required but not provided.
    #[error("Reversal reason is required")]
    ReversalReasonRequired,

    /// The entry to reverse has no postings to negate.
    #[error("Entry has no postings to reverse")]
    NothingToReverse,
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } => 409,
            Self::ReversalReasonRequired | Self::NothingToReverse => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::ReversalReasonRequired => "REVERSAL_REASON_REQUIRED",
            Self::NothingToReverse => "NOTHING_TO_REVERSE",
        }
    }
}
