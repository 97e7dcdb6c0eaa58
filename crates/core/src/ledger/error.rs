//! Ledger error types for validation and state errors.
//!
//! Structural errors are raised before anything is committed. State errors
//! come from the guarded transitions and are expected under races.

use rust_decimal::Decimal;
use snel_shared::AppError;
use snel_shared::types::{AccountId, CurrencyCode, EntryId};
use thiserror::Error;

use crate::ledger::account::AccountType;
use crate::ledger::entry::EntryType;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::EntryStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 postings.
    #[error("Entry must have at least 2 postings, got {count}")]
    EmptyPostings {
        /// Number of postings supplied.
        count: usize,
    },

    /// Debit total differs from credit total.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedPostings {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Posting amount is zero or negative.
    #[error("Posting amount must be positive, got {amount}")]
    InvalidAmount {
        /// Offending amount.
        amount: Decimal,
    },

    /// Posting amount has more decimal places than the currency allows.
    #[error("Posting amount {amount} exceeds {scale} decimal places")]
    PrecisionExceeded {
        /// Offending amount.
        amount: Decimal,
        /// Allowed decimal places.
        scale: u32,
    },

    /// Account currency differs from the entry currency.
    #[error("Account {account_id} is in {account_currency}, entry is in {entry_currency}")]
    CurrencyMismatch {
        /// The account.
        account_id: AccountId,
        /// Currency of the account.
        account_currency: CurrencyCode,
        /// Currency of the entry.
        entry_currency: CurrencyCode,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account number not found.
    #[error("Account number not found: {0}")]
    AccountNumberNotFound(String),

    /// Account is frozen and the initiator may not bypass it.
    #[error("Account {account_id} is frozen, {entry_type} not allowed")]
    AccountFrozen {
        /// The frozen account.
        account_id: AccountId,
        /// Entry type that was attempted.
        entry_type: EntryType,
    },

    /// Account number already belongs to a different holding.
    #[error("Account number '{0}' already exists for a different owner or type")]
    DuplicateAccount(String),

    /// Account type cannot be opened through this operation.
    #[error("Account type {0} cannot be opened for a customer")]
    InvalidAccountType(AccountType),

    /// Balance does not cover the requested amount.
    #[error("Insufficient funds in account {account_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The account.
        account_id: AccountId,
        /// Available balance.
        available: Decimal,
        /// Requested amount.
        requested: Decimal,
    },

    // ========== State Errors ==========
    /// Entry not found.
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Entry is not in the state the transition requires.
    #[error("Invalid state transition for entry: {from} to {to}")]
    InvalidStateTransition {
        /// Status observed at commit time.
        from: EntryStatus,
        /// Status the caller tried to reach.
        to: EntryStatus,
    },

    /// Reversal needs a non-blank reason.
    #[error("Reversal reason is required")]
    ReversalReasonRequired,

    // ========== Infrastructure Errors ==========
    /// Ledger configuration is invalid.
    #[error("Invalid ledger configuration: {0}")]
    InvalidConfiguration(String),

    /// Persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPostings { .. } => "EMPTY_POSTINGS",
            Self::UnbalancedPostings { .. } => "UNBALANCED_POSTINGS",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::PrecisionExceeded { .. } => "PRECISION_EXCEEDED",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::AccountNotFound(_) | Self::AccountNumberNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountFrozen { .. } => "ACCOUNT_FROZEN",
            Self::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            Self::InvalidAccountType(_) => "INVALID_ACCOUNT_TYPE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::ReversalReasonRequired => "REVERSAL_REASON_REQUIRED",
            Self::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - structural validation errors
            Self::EmptyPostings { .. }
            | Self::UnbalancedPostings { .. }
            | Self::InvalidAmount { .. }
            | Self::PrecisionExceeded { .. }
            | Self::CurrencyMismatch { .. }
            | Self::InvalidAccountType(_)
            | Self::ReversalReasonRequired => 400,

            // 403 Forbidden - frozen accounts
            Self::AccountFrozen { .. } => 403,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::AccountNumberNotFound(_) | Self::EntryNotFound(_) => {
                404
            }

            // 409 Conflict - duplicates and lost state races
            Self::DuplicateAccount(_) | Self::InvalidStateTransition { .. } => 409,

            // 422 - business policy raised by domain services
            Self::InsufficientFunds { .. } => 422,

            // 500 Internal Server Error
            Self::InvalidConfiguration(_) | Self::Storage(_) => 500,
        }
    }

    /// Returns true for outcomes an automated caller treats as a no-op.
    ///
    /// The entry already left the state the automation expected, because a
    /// manual approval or decline got there first.
    #[must_use]
    pub fn is_benign_race(&self) -> bool {
        matches!(self, Self::InvalidStateTransition { .. })
    }
}

impl From<WorkflowError> for LedgerError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::InvalidTransition { from, to } => {
                Self::InvalidStateTransition { from, to }
            }
            WorkflowError::ReversalReasonRequired => Self::ReversalReasonRequired,
            WorkflowError::NothingToReverse => Self::EmptyPostings { count: 0 },
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.http_status_code() {
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            422 => Self::BusinessRule(message),
            400 | 403 => Self::Validation(message),
            _ => match err {
                LedgerError::InvalidConfiguration(_) => Self::Configuration(message),
                _ => Self::Database(message),
            },
        }
    }
}
