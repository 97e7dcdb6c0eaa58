//! Workflow domain types for the entry lifecycle.
//!
//! This module defines the status an entry moves through and the
//! actions that move it, with the audit data each action records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snel_shared::types::UserId;
use std::fmt;

/// Entry status in the approval workflow.
///
/// The valid transitions are:
/// - Pending → Posted (approve)
/// - Pending → Declined (decline)
/// - Posted → Reversed (reverse, through a corrective entry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Awaiting approval; postings do not count toward balances.
    Pending,
    /// Approved; postings count toward balances.
    Posted,
    /// Rejected; postings never count.
    Declined,
    /// Negated by a corrective entry.
    Reversed,
}

impl EntryStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Posted => "POSTED",
            Self::Declined => "DECLINED",
            Self::Reversed => "REVERSED",
        }
    }

    /// Parses a status from a string. `APPROVED` is read as `POSTED`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "POSTED" | "APPROVED" => Some(Self::Posted),
            "DECLINED" => Some(Self::Declined),
            "REVERSED" => Some(Self::Reversed),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Declined | Self::Reversed)
    }

    /// Returns true if the entry's postings have been committed to balances.
    ///
    /// A reversed entry stays committed; its corrective entry offsets it.
    #[must_use]
    pub fn counts_toward_balance(&self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow action representing a state transition with audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Approve a pending entry.
    Approve {
        /// Status the entry must still have when the action is applied.
        expected: EntryStatus,
        /// The new status after approval.
        new_status: EntryStatus,
        /// The user who approved the entry.
        approved_by: UserId,
        /// When the entry was approved.
        approved_at: DateTime<Utc>,
    },
    /// Decline a pending entry.
    Decline {
        /// Status the entry must still have when the action is applied.
        expected: EntryStatus,
        /// The new status after declining.
        new_status: EntryStatus,
        /// The user who declined the entry.
        declined_by: UserId,
        /// When the entry was declined.
        declined_at: DateTime<Utc>,
    },
    /// Reverse a posted entry.
    Reverse {
        /// Status the entry must still have when the action is applied.
        expected: EntryStatus,
        /// The new status after reversal.
        new_status: EntryStatus,
        /// The user who reversed the entry.
        reversed_by: UserId,
        /// When the entry was reversed.
        reversed_at: DateTime<Utc>,
        /// The reason for the reversal.
        reason: String,
    },
}

impl WorkflowAction {
    /// Returns the status the entry must be in for the action to apply.
    #[must_use]
    pub fn expected_status(&self) -> EntryStatus {
        match self {
            Self::Approve { expected, .. }
            | Self::Decline { expected, .. }
            | Self::Reverse { expected, .. } => *expected,
        }
    }

    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> EntryStatus {
        match self {
            Self::Approve { new_status, .. }
            | Self::Decline { new_status, .. }
            | Self::Reverse { new_status, .. } => *new_status,
        }
    }

    /// Returns the acting user.
    #[must_use]
    pub fn actor(&self) -> UserId {
        match self {
            Self::Approve { approved_by, .. } => *approved_by,
            Self::Decline { declined_by, .. } => *declined_by,
            Self::Reverse { reversed_by, .. } => *reversed_by,
        }
    }

    /// Returns when the action happened.
    #[must_use]
    pub fn acted_at(&self) -> DateTime<Utc> {
        match self {
            Self::Approve { approved_at, .. } => *approved_at,
            Self::Decline { declined_at, .. } => *declined_at,
            Self::Reverse { reversed_at, .. } => *reversed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(EntryStatus::Pending.as_str(), "PENDING");
        assert_eq!(EntryStatus::Posted.as_str(), "POSTED");
        assert_eq!(EntryStatus::Declined.as_str(), "DECLINED");
        assert_eq!(EntryStatus::Reversed.as_str(), "REVERSED");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(EntryStatus::parse("pending"), Some(EntryStatus::Pending));
        assert_eq!(EntryStatus::parse("APPROVED"), Some(EntryStatus::Posted));
        assert_eq!(EntryStatus::parse("Posted"), Some(EntryStatus::Posted));
        assert_eq!(EntryStatus::parse("draft"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!EntryStatus::Pending.is_terminal());
        assert!(!EntryStatus::Posted.is_terminal());
        assert!(EntryStatus::Declined.is_terminal());
        assert!(EntryStatus::Reversed.is_terminal());
    }

    #[test]
    fn test_balance_counting_states() {
        assert!(!EntryStatus::Pending.counts_toward_balance());
        assert!(EntryStatus::Posted.counts_toward_balance());
        assert!(!EntryStatus::Declined.counts_toward_balance());
        assert!(EntryStatus::Reversed.counts_toward_balance());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(EntryStatus::Declined.to_string(), "DECLINED");
    }
}
