//! `LedgerStore` backed by a relational database.
//!
//! Every mutation runs in one database transaction. Status changes are a
//! compare-and-swap: the entry is re-read (row-locked on Postgres) and the
//! update only applies while the status is still the expected one. New
//! entries recheck their accounts inside the same transaction, with the
//! account rows share-locked on Postgres.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use snel_core::ledger::balance::{BalanceSums, PostingSums, StatementSnapshot};
use snel_core::ledger::{
    Account, AccountInfo, AccountOwner, AccountStatus, EntryFilter, LedgerEntry, LedgerError,
    LedgerPolicy, LedgerStore, PostingValidator,
};
use snel_core::workflow::WorkflowAction;
use snel_shared::types::{AccountId, EntryId, PageRequest, PageResponse};
use tracing::debug;

use crate::repositories::{AccountRepository, EntryRepository, is_unique_violation, storage};

/// Ledger store over a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct SeaOrmLedgerStore {
    db: DatabaseConnection,
}

impl SeaOrmLedgerStore {
    /// Creates a store over `db`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn begin(&self) -> Result<DatabaseTransaction, LedgerError> {
        self.db.begin().await.map_err(storage)
    }

    /// Rechecks the entry's accounts inside `txn`, then writes the entry.
    async fn checked_insert(
        txn: &DatabaseTransaction,
        entry: &LedgerEntry,
        policy: &LedgerPolicy,
    ) -> Result<(), LedgerError> {
        let ids: BTreeSet<AccountId> = entry.postings.iter().map(|p| p.account_id).collect();
        let ids: Vec<AccountId> = ids.into_iter().collect();
        let accounts = AccountRepository::new(txn).find_many_for_share(&ids).await?;
        PostingValidator::revalidate_accounts(
            entry,
            |id| accounts.iter().find(|a| a.id == id).map(AccountInfo::from),
            policy,
        )?;
        EntryRepository::new(txn).insert(entry).await
    }

    /// Applies `action` to entry `id` inside `txn` if its status still matches.
    async fn guarded_apply(
        txn: &DatabaseTransaction,
        id: EntryId,
        action: &WorkflowAction,
    ) -> Result<LedgerEntry, LedgerError> {
        let entries = EntryRepository::new(txn);
        let mut entry = entries
            .find_for_update(id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))?;

        let expected = action.expected_status();
        if entry.status != expected {
            return Err(LedgerError::InvalidStateTransition {
                from: entry.status,
                to: action.new_status(),
            });
        }

        entry.apply(action);
        if entries.compare_and_set(&entry, expected).await? != 1 {
            let current = entries
                .status_of(id)
                .await?
                .ok_or(LedgerError::EntryNotFound(id))?;
            debug!(entry_id = %id, status = %current, "Guarded update lost the race");
            return Err(LedgerError::InvalidStateTransition {
                from: current,
                to: action.new_status(),
            });
        }
        Ok(entry)
    }
}

#[async_trait]
impl LedgerStore for SeaOrmLedgerStore {
    async fn insert_account_if_absent(&self, account: Account) -> Result<Account, LedgerError> {
        let accounts = AccountRepository::new(&self.db);
        if let Some(existing) = accounts.find_by_number(&account.account_number).await? {
            return Ok(existing);
        }

        match accounts.insert(&account).await {
            Ok(()) => Ok(account),
            // Lost a race for the same number: hand back the winner's row.
            Err(err) if is_unique_violation(&err) => accounts
                .find_by_number(&account.account_number)
                .await?
                .ok_or_else(|| storage(err)),
            Err(err) => Err(storage(err)),
        }
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        AccountRepository::new(&self.db).find_by_id(id).await
    }

    async fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, LedgerError> {
        AccountRepository::new(&self.db).find_by_number(number).await
    }

    async fn find_accounts(&self, ids: &[AccountId]) -> Result<Vec<Account>, LedgerError> {
        AccountRepository::new(&self.db).find_many(ids).await
    }

    async fn accounts_for_owner(&self, owner: AccountOwner) -> Result<Vec<Account>, LedgerError> {
        AccountRepository::new(&self.db).list_by_owner(owner).await
    }

    async fn set_account_status(
        &self,
        id: AccountId,
        status: AccountStatus,
    ) -> Result<Account, LedgerError> {
        let txn = self.begin().await?;
        let accounts = AccountRepository::new(&txn);
        if accounts.update_status(id, status).await? == 0 {
            return Err(LedgerError::AccountNotFound(id));
        }
        let account = accounts
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;
        txn.commit().await.map_err(storage)?;
        Ok(account)
    }

    async fn insert_entry(
        &self,
        entry: &LedgerEntry,
        policy: &LedgerPolicy,
    ) -> Result<(), LedgerError> {
        let txn = self.begin().await?;
        Self::checked_insert(&txn, entry, policy).await?;
        txn.commit().await.map_err(storage)
    }

    async fn find_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>, LedgerError> {
        EntryRepository::new(&self.db).find_by_id(id).await
    }

    async fn transition(
        &self,
        id: EntryId,
        action: &WorkflowAction,
    ) -> Result<LedgerEntry, LedgerError> {
        let txn = self.begin().await?;
        let entry = Self::guarded_apply(&txn, id, action).await?;
        txn.commit().await.map_err(storage)?;
        Ok(entry)
    }

    async fn reverse(
        &self,
        id: EntryId,
        action: &WorkflowAction,
        correction: &LedgerEntry,
        policy: &LedgerPolicy,
    ) -> Result<LedgerEntry, LedgerError> {
        let txn = self.begin().await?;
        let original = Self::guarded_apply(&txn, id, action).await?;
        Self::checked_insert(&txn, correction, policy).await?;
        txn.commit().await.map_err(storage)?;
        Ok(original)
    }

    async fn balance_sums(&self, account_id: AccountId) -> Result<BalanceSums, LedgerError> {
        EntryRepository::new(&self.db).balance_sums(account_id).await
    }

    async fn statement_snapshot(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<StatementSnapshot, LedgerError> {
        let txn = self.begin().await?;
        let entries = EntryRepository::new(&txn);
        let opening = entries.committed_sums(&[account_id], None, Some(from)).await?;
        let postings = entries.statement_postings(account_id, from, to).await?;
        txn.commit().await.map_err(storage)?;
        Ok(StatementSnapshot { opening, postings })
    }

    async fn list_entries(
        &self,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<LedgerEntry>, LedgerError> {
        EntryRepository::new(&self.db).list(filter, page).await
    }

    async fn activity_sums(
        &self,
        accounts: &[AccountId],
        since: DateTime<Utc>,
    ) -> Result<PostingSums, LedgerError> {
        EntryRepository::new(&self.db)
            .committed_sums(accounts, Some(since), None)
            .await
    }
}
