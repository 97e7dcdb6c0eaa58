//! Repository abstractions for data access.
//!
//! Repositories borrow any `ConnectionTrait`, so the same queries run on the
//! pool or inside an open transaction. They translate between `SeaORM`
//! models and `snel-core` domain types.

pub mod account;
pub mod entry;

pub use account::AccountRepository;
pub use entry::EntryRepository;

use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use snel_core::ledger::LedgerError;
use uuid::Uuid;

/// A stored row that cannot be turned back into a domain value.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// Currency column holds something that is not an ISO code.
    #[error("row {id}: invalid currency {currency}")]
    Currency {
        /// Row ID.
        id: Uuid,
        /// Stored value.
        currency: String,
    },

    /// Customer account without a customer reference.
    #[error("account {0} is owned by a customer but has no customer_id")]
    MissingCustomer(Uuid),

    /// Entry details column does not match any known shape.
    #[error("entry {id}: unreadable details: {source}")]
    Details {
        /// Row ID.
        id: Uuid,
        /// Decoder error.
        source: serde_json::Error,
    },
}

impl From<RowError> for LedgerError {
    fn from(err: RowError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Maps a database error to `LedgerError::Storage`.
pub(crate) fn storage(err: DbErr) -> LedgerError {
    LedgerError::Storage(err.to_string())
}

/// Returns true for unique constraint violations on any backend.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Normalizes an amount read back from storage to two decimal places.
///
/// SQLite returns money columns as floating point; Postgres returns them
/// exact. Both come back with scale 2.
pub(crate) fn money(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount
}
