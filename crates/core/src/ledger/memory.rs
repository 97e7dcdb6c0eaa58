//! In-memory ledger store for tests and embedding.
//!
//! A single lock guards all state, so every operation observes and
//! produces a consistent snapshot.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snel_shared::types::{AccountId, EntryId, PageRequest, PageResponse};

use crate::ledger::account::{Account, AccountOwner, AccountStatus};
use crate::ledger::balance::{BalanceSums, PostingSums, StatementPosting, StatementSnapshot};
use crate::ledger::entry::LedgerEntry;
use crate::ledger::error::LedgerError;
use crate::ledger::policy::LedgerPolicy;
use crate::ledger::store::{EntryFilter, LedgerStore};
use crate::ledger::validation::{AccountInfo, PostingValidator};
use crate::workflow::types::WorkflowAction;

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    account_numbers: HashMap<String, AccountId>,
    /// Insertion order.
    entries: Vec<LedgerEntry>,
    entry_index: HashMap<EntryId, usize>,
    references: HashSet<String>,
}

impl State {
    fn check_insertable(&self, entry: &LedgerEntry, policy: &LedgerPolicy) -> Result<(), LedgerError> {
        if self.entry_index.contains_key(&entry.id) || self.references.contains(&entry.reference) {
            return Err(LedgerError::Storage(format!(
                "duplicate entry reference {}",
                entry.reference
            )));
        }
        PostingValidator::revalidate_accounts(
            entry,
            |id| self.accounts.get(&id).map(AccountInfo::from),
            policy,
        )?;
        Ok(())
    }

    fn push_entry(&mut self, entry: LedgerEntry) {
        self.entry_index.insert(entry.id, self.entries.len());
        self.references.insert(entry.reference.clone());
        self.entries.push(entry);
    }

    /// Compare-and-swap on the entry status.
    fn guarded_apply(
        &mut self,
        id: EntryId,
        action: &WorkflowAction,
    ) -> Result<&mut LedgerEntry, LedgerError> {
        let idx = *self
            .entry_index
            .get(&id)
            .ok_or(LedgerError::EntryNotFound(id))?;
        let entry = &mut self.entries[idx];
        if entry.status != action.expected_status() {
            return Err(LedgerError::InvalidStateTransition {
                from: entry.status,
                to: action.new_status(),
            });
        }
        entry.apply(action);
        Ok(entry)
    }
}

/// Ledger store held entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<State>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries stored.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lock is poisoned.
    pub fn entry_count(&self) -> Result<usize, LedgerError> {
        Ok(self.read()?.entries.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, LedgerError> {
        self.state
            .read()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, LedgerError> {
        self.state
            .write()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_account_if_absent(&self, account: Account) -> Result<Account, LedgerError> {
        let mut state = self.write()?;
        if let Some(existing) = state
            .account_numbers
            .get(&account.account_number)
            .and_then(|id| state.accounts.get(id))
        {
            return Ok(existing.clone());
        }
        state
            .account_numbers
            .insert(account.account_number.clone(), account.id);
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    async fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, LedgerError> {
        let state = self.read()?;
        Ok(state
            .account_numbers
            .get(number)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn find_accounts(&self, ids: &[AccountId]) -> Result<Vec<Account>, LedgerError> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.accounts.get(id))
            .cloned()
            .collect())
    }

    async fn accounts_for_owner(&self, owner: AccountOwner) -> Result<Vec<Account>, LedgerError> {
        let state = self.read()?;
        let mut accounts: Vec<_> = state
            .accounts
            .values()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| (a.created_at, a.account_number.clone()));
        Ok(accounts)
    }

    async fn set_account_status(
        &self,
        id: AccountId,
        status: AccountStatus,
    ) -> Result<Account, LedgerError> {
        let mut state = self.write()?;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        account.status = status;
        Ok(account.clone())
    }

    async fn insert_entry(
        &self,
        entry: &LedgerEntry,
        policy: &LedgerPolicy,
    ) -> Result<(), LedgerError> {
        let mut state = self.write()?;
        state.check_insertable(entry, policy)?;
        state.push_entry(entry.clone());
        Ok(())
    }

    async fn find_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>, LedgerError> {
        let state = self.read()?;
        Ok(state
            .entry_index
            .get(&id)
            .map(|idx| state.entries[*idx].clone()))
    }

    async fn transition(
        &self,
        id: EntryId,
        action: &WorkflowAction,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.write()?;
        state.guarded_apply(id, action).map(|entry| entry.clone())
    }

    async fn reverse(
        &self,
        id: EntryId,
        action: &WorkflowAction,
        correction: &LedgerEntry,
        policy: &LedgerPolicy,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.write()?;
        // Check both halves before mutating either.
        state.check_insertable(correction, policy)?;
        let original = state.guarded_apply(id, action)?.clone();
        state.push_entry(correction.clone());
        Ok(original)
    }

    async fn balance_sums(&self, account_id: AccountId) -> Result<BalanceSums, LedgerError> {
        let state = self.read()?;
        Ok(BalanceSums::from_entries(&state.entries, account_id))
    }

    async fn statement_snapshot(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<StatementSnapshot, LedgerError> {
        let state = self.read()?;
        let mut snapshot = StatementSnapshot::default();
        for entry in state
            .entries
            .iter()
            .filter(|e| e.status.counts_toward_balance() && e.created_at < to)
        {
            for posting in entry.postings.iter().filter(|p| p.account_id == account_id) {
                if entry.created_at < from {
                    snapshot.opening.add(posting.direction, posting.amount);
                } else {
                    snapshot.postings.push(StatementPosting {
                        entry_id: entry.id,
                        reference: entry.reference.clone(),
                        entry_type: entry.entry_type(),
                        created_at: entry.created_at,
                        direction: posting.direction,
                        amount: posting.amount,
                        description: posting.description.clone(),
                    });
                }
            }
        }
        snapshot.postings.sort_by_key(|p| p.created_at);
        Ok(snapshot)
    }

    async fn list_entries(
        &self,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<LedgerEntry>, LedgerError> {
        let state = self.read()?;
        let mut matching: Vec<&LedgerEntry> =
            state.entries.iter().rev().filter(|e| filter.matches(e)).collect();
        // Stable sort keeps newer insertions first among equal timestamps.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let data = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(PageResponse::new(data, page, total))
    }

    async fn activity_sums(
        &self,
        accounts: &[AccountId],
        since: DateTime<Utc>,
    ) -> Result<PostingSums, LedgerError> {
        let state = self.read()?;
        let mut sums = PostingSums::default();
        for entry in state
            .entries
            .iter()
            .filter(|e| e.status.counts_toward_balance() && e.created_at >= since)
        {
            for posting in entry
                .postings
                .iter()
                .filter(|p| accounts.contains(&p.account_id))
            {
                sums.add(posting.direction, posting.amount);
            }
        }
        Ok(sums)
    }
}
