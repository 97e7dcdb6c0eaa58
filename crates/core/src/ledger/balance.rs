//! Derived balances, statements and activity totals.
//!
//! Nothing here is ever persisted. Every figure is recomputed from the
//! postings of entries whose status counts toward the balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use snel_shared::types::{AccountId, CurrencyCode, EntryId};

use crate::ledger::entry::{Direction, EntryType, LedgerEntry};
use crate::ledger::error::LedgerError;
use crate::workflow::types::EntryStatus;

/// Debit and credit totals of an account over some set of postings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingSums {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
}

impl PostingSums {
    /// Adds one posting.
    pub fn add(&mut self, direction: Direction, amount: Decimal) {
        match direction {
            Direction::Debit => self.debit += amount,
            Direction::Credit => self.credit += amount,
        }
    }

    /// Credit minus debit.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.credit - self.debit
    }
}

/// Posting totals of one account, split by whether they count yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSums {
    /// Postings of POSTED entries and of REVERSED originals.
    pub committed: PostingSums,
    /// Postings of PENDING entries.
    pub pending: PostingSums,
}

impl BalanceSums {
    /// Accumulates the postings of `entries` that touch `account_id`.
    ///
    /// Declined entries are ignored entirely.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a LedgerEntry>,
        account_id: AccountId,
    ) -> Self {
        let mut sums = Self::default();
        for entry in entries {
            let bucket = if entry.status.counts_toward_balance() {
                &mut sums.committed
            } else if entry.status == EntryStatus::Pending {
                &mut sums.pending
            } else {
                continue;
            };
            for posting in entry.postings.iter().filter(|p| p.account_id == account_id) {
                bucket.add(posting.direction, posting.amount);
            }
        }
        sums
    }
}

/// Available, pending and total balance of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// The account ID.
    pub account_id: AccountId,
    /// Currency of the account.
    pub currency: CurrencyCode,
    /// Balance over committed entries.
    pub available: Decimal,
    /// Net effect of entries still awaiting approval.
    pub pending: Decimal,
    /// `available + pending`.
    pub total: Decimal,
}

impl BalanceSummary {
    /// Creates a summary from one consistent read of the account's sums.
    #[must_use]
    pub fn new(account_id: AccountId, currency: CurrencyCode, sums: BalanceSums) -> Self {
        let available = sums.committed.net();
        let pending = sums.pending.net();
        Self {
            account_id,
            currency,
            available,
            pending,
            total: available + pending,
        }
    }

    /// Checks that the available balance covers `amount`.
    ///
    /// Overdraft policy belongs to the calling domain service; the ledger
    /// never calls this itself.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if `amount` exceeds the available balance.
    pub fn ensure_covers(&self, amount: Decimal) -> Result<(), LedgerError> {
        if amount > self.available {
            return Err(LedgerError::InsufficientFunds {
                account_id: self.account_id,
                available: self.available,
                requested: amount,
            });
        }
        Ok(())
    }
}

/// Debit and credit totals across an owner's accounts since a cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityInsights {
    /// Start of the window.
    pub since: DateTime<Utc>,
    /// Money out.
    pub total_debits: Decimal,
    /// Money in.
    pub total_credits: Decimal,
}

impl ActivityInsights {
    /// Creates insights from posting totals.
    #[must_use]
    pub fn new(since: DateTime<Utc>, sums: PostingSums) -> Self {
        Self {
            since,
            total_debits: sums.debit,
            total_credits: sums.credit,
        }
    }

    /// Credits minus debits over the window.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.total_credits - self.total_debits
    }
}

/// One committed posting as read for a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPosting {
    /// Parent entry.
    pub entry_id: EntryId,
    /// Parent entry reference.
    pub reference: String,
    /// Parent entry type.
    pub entry_type: EntryType,
    /// Parent entry creation time.
    pub created_at: DateTime<Utc>,
    /// Debit or credit.
    pub direction: Direction,
    /// Posting amount.
    pub amount: Decimal,
    /// Posting description.
    pub description: String,
}

/// Raw statement data read from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementSnapshot {
    /// Committed totals before the period.
    pub opening: PostingSums,
    /// Committed postings in the period, oldest first.
    pub postings: Vec<StatementPosting>,
}

/// A statement line with the balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// The posting.
    #[serde(flatten)]
    pub posting: StatementPosting,
    /// Balance after this posting.
    pub running_balance: Decimal,
}

/// Account statement for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// The account ID.
    pub account_id: AccountId,
    /// Currency of the account.
    pub currency: CurrencyCode,
    /// Start of the period, inclusive.
    pub from: DateTime<Utc>,
    /// End of the period, exclusive.
    pub to: DateTime<Utc>,
    /// Balance before `from`.
    pub opening_balance: Decimal,
    /// Postings in the period.
    pub lines: Vec<StatementLine>,
    /// Balance after the last line.
    pub closing_balance: Decimal,
}

impl Statement {
    /// Builds a statement, chaining running balances from the opening balance.
    ///
    /// Each line's running balance equals the previous line's plus the
    /// line's signed amount.
    #[must_use]
    pub fn build(
        account_id: AccountId,
        currency: CurrencyCode,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        snapshot: StatementSnapshot,
    ) -> Self {
        let opening_balance = snapshot.opening.net();
        let mut running = opening_balance;
        let lines = snapshot
            .postings
            .into_iter()
            .map(|posting| {
                running += posting.direction.signed(posting.amount);
                StatementLine {
                    posting,
                    running_balance: running,
                }
            })
            .collect();

        Self {
            account_id,
            currency,
            from,
            to,
            opening_balance,
            lines,
            closing_balance: running,
        }
    }
}
