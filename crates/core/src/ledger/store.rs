//! Persistence seam of the ledger.
//!
//! Implementations must make every mutating method atomic: a reader never
//! observes part of an entry's postings, and a status transition is a
//! compare-and-swap against the status the workflow action expects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snel_shared::types::{AccountId, EntryId, PageRequest, PageResponse, UserId};

use crate::ledger::account::{Account, AccountOwner, AccountStatus};
use crate::ledger::balance::{BalanceSums, PostingSums, StatementSnapshot};
use crate::ledger::entry::{EntryType, LedgerEntry};
use crate::ledger::error::LedgerError;
use crate::ledger::policy::LedgerPolicy;
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Filter for the audit and activity feeds.
///
/// Results are always ordered by `created_at` descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Only entries in this status.
    pub status: Option<EntryStatus>,
    /// Only entries of this type.
    pub entry_type: Option<EntryType>,
    /// Only entries created by this user.
    pub created_by: Option<UserId>,
    /// Only entries with a posting against one of these accounts.
    pub accounts: Option<Vec<AccountId>>,
    /// Created at or after this time.
    pub created_from: Option<DateTime<Utc>>,
    /// Created strictly before this time.
    pub created_before: Option<DateTime<Utc>>,
}

impl EntryFilter {
    /// Entries in `status`.
    #[must_use]
    pub fn with_status(status: EntryStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Restricts to one entry type.
    #[must_use]
    pub fn entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    /// Restricts to one creator.
    #[must_use]
    pub fn created_by(mut self, user: UserId) -> Self {
        self.created_by = Some(user);
        self
    }

    /// Restricts to entries touching any of `accounts`.
    #[must_use]
    pub fn accounts(mut self, accounts: Vec<AccountId>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Restricts to the half-open window `[from, before)`.
    #[must_use]
    pub fn between(mut self, from: Option<DateTime<Utc>>, before: Option<DateTime<Utc>>) -> Self {
        self.created_from = from;
        self.created_before = before;
        self
    }

    /// Returns true if `entry` passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.status.is_none_or(|s| entry.status == s)
            && self.entry_type.is_none_or(|t| entry.entry_type() == t)
            && self.created_by.is_none_or(|u| entry.created_by == u)
            && self
                .accounts
                .as_ref()
                .is_none_or(|ids| ids.iter().any(|id| entry.touches(*id)))
            && self.created_from.is_none_or(|from| entry.created_at >= from)
            && self.created_before.is_none_or(|before| entry.created_at < before)
    }
}

/// Storage backend for accounts, entries and postings.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert `account` unless its account number is already taken.
    ///
    /// Returns the stored account: `account` itself, or the record that
    /// already holds the number.
    async fn insert_account_if_absent(&self, account: Account) -> Result<Account, LedgerError>;

    /// Get an account by ID.
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError>;

    /// Get an account by account number.
    async fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, LedgerError>;

    /// Get several accounts by ID. Missing IDs are skipped.
    async fn find_accounts(&self, ids: &[AccountId]) -> Result<Vec<Account>, LedgerError>;

    /// List the accounts of an owner, oldest first.
    async fn accounts_for_owner(&self, owner: AccountOwner) -> Result<Vec<Account>, LedgerError>;

    /// Set an account's status.
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    async fn set_account_status(
        &self,
        id: AccountId,
        status: AccountStatus,
    ) -> Result<Account, LedgerError>;

    /// Persist an entry together with all of its postings.
    ///
    /// The touched accounts are read again inside the write and checked with
    /// `PostingValidator::revalidate_accounts`, and they stay locked against
    /// status changes until it commits.
    async fn insert_entry(
        &self,
        entry: &LedgerEntry,
        policy: &LedgerPolicy,
    ) -> Result<(), LedgerError>;

    /// Get an entry with its postings.
    async fn find_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Apply `action` if the entry is still in `action.expected_status()`.
    ///
    /// Returns `EntryNotFound` if the entry does not exist and
    /// `InvalidStateTransition` carrying the current status if another caller
    /// moved it first.
    async fn transition(
        &self,
        id: EntryId,
        action: &WorkflowAction,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Mark `id` REVERSED and insert its committed `correction` atomically.
    ///
    /// Same guard as `transition`, and the correction's accounts are
    /// rechecked as in `insert_entry`. Returns the updated original.
    async fn reverse(
        &self,
        id: EntryId,
        action: &WorkflowAction,
        correction: &LedgerEntry,
        policy: &LedgerPolicy,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Committed and pending posting totals of one account, from one snapshot.
    async fn balance_sums(&self, account_id: AccountId) -> Result<BalanceSums, LedgerError>;

    /// Opening totals and committed postings in `[from, to)`, from one snapshot.
    async fn statement_snapshot(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<StatementSnapshot, LedgerError>;

    /// Page through entries matching `filter`, newest first.
    async fn list_entries(
        &self,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<LedgerEntry>, LedgerError>;

    /// Committed posting totals across `accounts` for entries created since `since`.
    async fn activity_sums(
        &self,
        accounts: &[AccountId],
        since: DateTime<Utc>,
    ) -> Result<PostingSums, LedgerError>;
}
