//! Ledger service: the operations domain services call.
//!
//! `Ledger` validates proposed entries, persists them through a
//! `LedgerStore`, drives the entry state machine and derives balances. The
//! store's compare-and-swap is the only place a status changes, so manual
//! and automated callers share one guarded transition.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use snel_shared::types::{
    AccountId, CurrencyCode, CustomerId, EntryId, PageRequest, PageResponse, PostingId, UserId,
};
use tracing::{debug, info, warn};

use crate::ledger::account::{
    Account, AccountOwner, AccountStatus, AccountType, customer_account_number,
};
use crate::ledger::balance::{ActivityInsights, BalanceSummary, Statement};
use crate::ledger::entry::{EntryType, Initiator, LedgerEntry, LedgerPosting, NewEntry};
use crate::ledger::error::LedgerError;
use crate::ledger::policy::LedgerPolicy;
use crate::ledger::reference::generate_reference;
use crate::ledger::store::{EntryFilter, LedgerStore};
use crate::ledger::validation::{AccountInfo, PostingValidator};
use crate::notify::{LedgerNotification, NoopNotificationSink, NotificationSink};
use crate::workflow::reversal::ReversalService;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Result of reversing an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversedEntry {
    /// The original entry, now REVERSED.
    pub original: LedgerEntry,
    /// The corrective entry, committed as POSTED.
    pub correction: LedgerEntry,
}

/// The double-entry ledger.
pub struct Ledger<S> {
    store: Arc<S>,
    policy: LedgerPolicy,
    sink: Arc<dyn NotificationSink>,
}

impl<S> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S: LedgerStore> Ledger<S> {
    /// Creates a ledger over `store` that sends no notifications.
    #[must_use]
    pub fn new(store: Arc<S>, policy: LedgerPolicy) -> Self {
        Self {
            store,
            policy,
            sink: Arc::new(NoopNotificationSink),
        }
    }

    /// Replaces the notification sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The policy the validator honors.
    #[must_use]
    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Open a customer account, or return the one already open.
    ///
    /// The account number is derived from the customer and type, so
    /// concurrent callers provisioning the same account converge on one
    /// record.
    ///
    /// # Errors
    ///
    /// - `InvalidAccountType` for a SYSTEM account
    /// - `DuplicateAccount` if the number is held in another currency
    pub async fn create_account(
        &self,
        customer: CustomerId,
        account_type: AccountType,
        currency: CurrencyCode,
    ) -> Result<Account, LedgerError> {
        if account_type == AccountType::System {
            return Err(LedgerError::InvalidAccountType(account_type));
        }
        let number = customer_account_number(customer, account_type);
        let candidate = Account::open(
            AccountOwner::Customer(customer),
            account_type,
            currency,
            number,
        );
        self.insert_or_existing(candidate).await
    }

    /// Open a SYSTEM account under a fixed number, or return the one already open.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccount` if the number belongs to a non-system
    /// account or to a system account in another currency.
    pub async fn open_system_account(
        &self,
        account_number: &str,
        currency: CurrencyCode,
    ) -> Result<Account, LedgerError> {
        let candidate = Account::open(
            AccountOwner::System,
            AccountType::System,
            currency,
            account_number.to_string(),
        );
        self.insert_or_existing(candidate).await
    }

    async fn insert_or_existing(&self, candidate: Account) -> Result<Account, LedgerError> {
        let stored = self.store.insert_account_if_absent(candidate.clone()).await?;
        if stored.id == candidate.id {
            info!(
                account_id = %stored.id,
                account_number = %stored.account_number,
                account_type = %stored.account_type,
                "Account opened"
            );
            return Ok(stored);
        }
        if stored.same_holding(&candidate) {
            debug!(account_number = %stored.account_number, "Account already open");
            return Ok(stored);
        }
        Err(LedgerError::DuplicateAccount(candidate.account_number))
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it does not exist.
    pub async fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .find_account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Get an account by account number.
    ///
    /// # Errors
    ///
    /// Returns `AccountNumberNotFound` if it does not exist.
    pub async fn account_by_number(&self, number: &str) -> Result<Account, LedgerError> {
        self.store
            .find_account_by_number(number)
            .await?
            .ok_or_else(|| LedgerError::AccountNumberNotFound(number.to_string()))
    }

    /// List an owner's accounts.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub async fn accounts_for_owner(&self, owner: AccountOwner) -> Result<Vec<Account>, LedgerError> {
        self.store.accounts_for_owner(owner).await
    }

    /// Freeze or unfreeze an account. Admin action.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it does not exist.
    pub async fn set_account_status(
        &self,
        id: AccountId,
        status: AccountStatus,
    ) -> Result<Account, LedgerError> {
        let account = self.store.set_account_status(id, status).await?;
        info!(account_id = %id, status = %status, "Account status changed");
        if let Some(customer) = account.owner.customer() {
            self.sink.notify(LedgerNotification::AccountStatusChanged {
                customer,
                account_id: id,
                new_status: status,
            });
        }
        Ok(account)
    }

    // ========================================================================
    // Balances
    // ========================================================================

    /// Credits minus debits over committed entries.
    ///
    /// Committed means POSTED or REVERSED. A reversed original keeps
    /// counting and its POSTED correction offsets it exactly, so after a
    /// reversal the balance is what it was before the original was approved.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn balance(&self, id: AccountId) -> Result<Decimal, LedgerError> {
        Ok(self.balance_summary(id).await?.available)
    }

    /// Credits minus debits over entries still awaiting approval.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn pending_balance(&self, id: AccountId) -> Result<Decimal, LedgerError> {
        Ok(self.balance_summary(id).await?.pending)
    }

    /// Available, pending and total balance from one consistent read.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn balance_summary(&self, id: AccountId) -> Result<BalanceSummary, LedgerError> {
        let account = self.account(id).await?;
        let sums = self.store.balance_sums(id).await?;
        Ok(BalanceSummary::new(id, account.currency, sums))
    }

    // ========================================================================
    // Entries
    // ========================================================================

    /// Validate and persist a new PENDING entry with its postings.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure (see `PostingValidator`) or
    /// `Storage`. Nothing is persisted on error.
    pub async fn create_entry(&self, new_entry: NewEntry) -> Result<LedgerEntry, LedgerError> {
        let accounts = self.accounts_of(&new_entry).await?;
        PostingValidator::validate(
            &new_entry,
            |id| accounts.get(&id).map(AccountInfo::from),
            &self.policy,
        )?;

        let entry = Self::materialize(new_entry, EntryStatus::Pending, None, Utc::now());
        self.store.insert_entry(&entry, &self.policy).await?;

        info!(
            entry_id = %entry.id,
            reference = %entry.reference,
            entry_type = %entry.entry_type(),
            amount = %entry.amount(),
            initiated_as = %entry.initiated_as,
            "Entry created"
        );
        self.notify_entry(&entry, &accounts);
        Ok(entry)
    }

    /// Get an entry with its postings.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if it does not exist.
    pub async fn entry(&self, id: EntryId) -> Result<LedgerEntry, LedgerError> {
        self.store
            .find_entry(id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))
    }

    /// Approve a PENDING entry, committing its postings to balances.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the entry is not PENDING when the
    /// transition commits, including when a concurrent caller won the race.
    pub async fn approve(&self, id: EntryId, approver: UserId) -> Result<LedgerEntry, LedgerError> {
        let current = self.entry(id).await?;
        let action = WorkflowService::approve(current.status, approver)?;
        self.apply(id, &action).await
    }

    /// Decline a PENDING entry. Declined entries never count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the entry is not PENDING when the
    /// transition commits.
    pub async fn decline(&self, id: EntryId, approver: UserId) -> Result<LedgerEntry, LedgerError> {
        let current = self.entry(id).await?;
        let action = WorkflowService::decline(current.status, approver)?;
        self.apply(id, &action).await
    }

    /// Approve on behalf of automation.
    ///
    /// An entry that already left PENDING (approved or declined by someone
    /// else) is a silent no-op and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns every error `approve` returns except lost state races.
    pub async fn auto_approve(
        &self,
        id: EntryId,
        approver: UserId,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        match self.approve(id, approver).await {
            Ok(entry) => Ok(Some(entry)),
            Err(err) if err.is_benign_race() => {
                debug!(entry_id = %id, error = %err, "Automatic approval skipped");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Reverse a POSTED entry through a new corrective entry.
    ///
    /// The original is marked REVERSED and never edited otherwise. The
    /// correction mirrors its postings with directions swapped and commits
    /// already POSTED, in the same atomic unit.
    ///
    /// # Errors
    ///
    /// - `ReversalReasonRequired` for a blank reason
    /// - `InvalidStateTransition` if the entry is not POSTED
    /// - validation errors for the correction, e.g. `AccountFrozen`
    pub async fn reverse(
        &self,
        id: EntryId,
        initiator: Initiator,
        reason: &str,
    ) -> Result<ReversedEntry, LedgerError> {
        let current = self.entry(id).await?;
        let action = WorkflowService::reverse(
            current.status,
            initiator.user_id,
            reason.trim().to_string(),
        )?;
        let correction = ReversalService::reversing_entry(&current, initiator, reason)?;

        let accounts = self.accounts_of(&correction).await?;
        PostingValidator::validate(
            &correction,
            |id| accounts.get(&id).map(AccountInfo::from),
            &self.policy,
        )?;

        let correction = Self::materialize(
            correction,
            EntryStatus::Posted,
            Some(initiator.user_id),
            action.acted_at(),
        );
        let original = self.store.reverse(id, &action, &correction, &self.policy).await?;

        info!(
            entry_id = %id,
            correction_id = %correction.id,
            reversed_by = %initiator.user_id,
            reason = %reason.trim(),
            "Entry reversed"
        );
        self.notify_entry(&original, &accounts);
        Ok(ReversedEntry {
            original,
            correction,
        })
    }

    async fn apply(&self, id: EntryId, action: &WorkflowAction) -> Result<LedgerEntry, LedgerError> {
        let entry = self.store.transition(id, action).await?;
        info!(
            entry_id = %id,
            status = %entry.status,
            actor = %action.actor(),
            "Entry status changed"
        );
        self.notify_after_commit(&entry).await;
        Ok(entry)
    }

    // ========================================================================
    // Feeds and reports
    // ========================================================================

    /// Audit feed: entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub async fn feed(
        &self,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<LedgerEntry>, LedgerError> {
        self.store.list_entries(filter, page).await
    }

    /// Entries touching any of a customer's accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub async fn customer_activity(
        &self,
        customer: CustomerId,
        entry_type: Option<EntryType>,
        page: PageRequest,
    ) -> Result<PageResponse<LedgerEntry>, LedgerError> {
        let ids = self.customer_account_ids(customer).await?;
        let mut filter = EntryFilter::default().accounts(ids);
        filter.entry_type = entry_type;
        self.store.list_entries(&filter, page).await
    }

    /// Committed money in and out across a customer's accounts since `since`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub async fn activity_insights(
        &self,
        customer: CustomerId,
        since: DateTime<Utc>,
    ) -> Result<ActivityInsights, LedgerError> {
        let ids = self.customer_account_ids(customer).await?;
        let sums = self.store.activity_sums(&ids, since).await?;
        Ok(ActivityInsights::new(since, sums))
    }

    /// Statement of committed postings in `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn statement(
        &self,
        id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Statement, LedgerError> {
        let account = self.account(id).await?;
        let snapshot = self.store.statement_snapshot(id, from, to).await?;
        Ok(Statement::build(id, account.currency, from, to, snapshot))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn customer_account_ids(&self, customer: CustomerId) -> Result<Vec<AccountId>, LedgerError> {
        Ok(self
            .store
            .accounts_for_owner(AccountOwner::Customer(customer))
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect())
    }

    async fn accounts_of(&self, entry: &NewEntry) -> Result<HashMap<AccountId, Account>, LedgerError> {
        let ids: BTreeSet<AccountId> = entry.postings.iter().map(|p| p.account_id).collect();
        let ids: Vec<AccountId> = ids.into_iter().collect();
        Ok(self
            .store
            .find_accounts(&ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect())
    }

    fn materialize(
        new_entry: NewEntry,
        status: EntryStatus,
        approved_by: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> LedgerEntry {
        let id = EntryId::new();
        let postings = new_entry
            .postings
            .into_iter()
            .map(|p| LedgerPosting {
                id: PostingId::new(),
                entry_id: id,
                account_id: p.account_id,
                direction: p.direction,
                amount: p.amount,
                description: p.description,
            })
            .collect();

        LedgerEntry {
            id,
            reference: generate_reference(),
            details: new_entry.details,
            currency: new_entry.currency,
            created_by: new_entry.initiator.user_id,
            initiated_as: new_entry.initiator.role,
            created_at,
            status,
            approved_by,
            approved_at: approved_by.map(|_| created_at),
            memo: new_entry.memo,
            postings,
        }
    }

    /// Notify after a transition, resolving owners from the store.
    ///
    /// The transition is already committed, so a lookup failure is logged
    /// and the notification skipped.
    async fn notify_after_commit(&self, entry: &LedgerEntry) {
        let ids: BTreeSet<AccountId> = entry.postings.iter().map(|p| p.account_id).collect();
        let ids: Vec<AccountId> = ids.into_iter().collect();
        match self.store.find_accounts(&ids).await {
            Ok(accounts) => {
                let accounts = accounts.into_iter().map(|a| (a.id, a)).collect();
                self.notify_entry(entry, &accounts);
            }
            Err(err) => {
                warn!(entry_id = %entry.id, error = %err, "Skipping notification, account lookup failed");
            }
        }
    }

    /// One notification per customer account the entry touches.
    fn notify_entry(&self, entry: &LedgerEntry, accounts: &HashMap<AccountId, Account>) {
        let touched: BTreeSet<AccountId> = entry.postings.iter().map(|p| p.account_id).collect();
        for account_id in touched {
            let Some(customer) = accounts.get(&account_id).and_then(|a| a.owner.customer()) else {
                continue;
            };
            self.sink.notify(LedgerNotification::EntryStatusChanged {
                customer,
                account_id,
                entry_id: entry.id,
                entry_type: entry.entry_type(),
                amount: entry.amount(),
                new_status: entry.status,
            });
        }
    }
}
