//! Business rule validation for proposed entries.
//!
//! Validation is pure: account state comes in through a lookup closure and
//! nothing is written. A posting set either passes as a whole or the first
//! violated rule is reported.

use rust_decimal::Decimal;
use snel_shared::types::{AccountId, CurrencyCode, FIAT_SCALE, fits_scale};

use crate::ledger::account::{Account, AccountStatus};
use crate::ledger::entry::{Direction, EntryType, Initiator, LedgerEntry, NewEntry};
use crate::ledger::error::LedgerError;
use crate::ledger::policy::LedgerPolicy;

/// Information about an account needed for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// The account's currency.
    pub currency: CurrencyCode,
    /// Lifecycle status.
    pub status: AccountStatus,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            currency: account.currency.clone(),
            status: account.status,
        }
    }
}

/// Totals of a posting set that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedPostings {
    /// Sum of debit legs.
    pub total_debit: Decimal,
    /// Sum of credit legs, equal to `total_debit`.
    pub total_credit: Decimal,
    /// Set when a frozen account was accepted through the policy bypass.
    pub bypassed_frozen: bool,
}

/// Stateless posting set validator.
pub struct PostingValidator;

impl PostingValidator {
    /// Validate a proposed entry.
    ///
    /// Rules are checked in this order:
    /// 1. At least 2 postings
    /// 2. Every amount strictly positive
    /// 3. No amount beyond 2 decimal places (never rounded)
    /// 4. Both sides present and debits equal credits
    /// 5. Every account exists
    /// 6. Every account is in the entry currency
    /// 7. No frozen account, unless the policy grants the bypass
    ///
    /// # Errors
    ///
    /// Returns the `LedgerError` of the first violated rule.
    pub fn validate<A>(
        entry: &NewEntry,
        account_lookup: A,
        policy: &LedgerPolicy,
    ) -> Result<ValidatedPostings, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        if entry.postings.len() < 2 {
            return Err(LedgerError::EmptyPostings {
                count: entry.postings.len(),
            });
        }

        for posting in &entry.postings {
            if posting.amount <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount {
                    amount: posting.amount,
                });
            }
            if !fits_scale(posting.amount, FIAT_SCALE) {
                return Err(LedgerError::PrecisionExceeded {
                    amount: posting.amount,
                    scale: FIAT_SCALE,
                });
            }
        }

        let (total_debit, total_credit) = Self::totals(entry);
        let has_both_sides = entry.postings.iter().any(|p| p.direction == Direction::Debit)
            && entry.postings.iter().any(|p| p.direction == Direction::Credit);
        if !has_both_sides || total_debit != total_credit {
            return Err(LedgerError::UnbalancedPostings {
                debit: total_debit,
                credit: total_credit,
            });
        }

        let bypassed_frozen = Self::check_accounts(
            entry.postings.iter().map(|p| p.account_id),
            &entry.currency,
            entry.initiator,
            entry.entry_type(),
            account_lookup,
            policy,
        )?;

        Ok(ValidatedPostings {
            total_debit,
            total_credit,
            bypassed_frozen,
        })
    }

    /// Re-run the account rules (5 to 7) for an entry about to be written.
    ///
    /// Stores call this inside the write with the accounts as they stand
    /// there, so a freeze that committed after `validate` still rejects the
    /// entry. Returns whether the frozen bypass was used.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`, `CurrencyMismatch` or `AccountFrozen`.
    pub fn revalidate_accounts<A>(
        entry: &LedgerEntry,
        account_lookup: A,
        policy: &LedgerPolicy,
    ) -> Result<bool, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        Self::check_accounts(
            entry.postings.iter().map(|p| p.account_id),
            &entry.currency,
            entry.initiator(),
            entry.entry_type(),
            account_lookup,
            policy,
        )
    }

    fn check_accounts<A>(
        account_ids: impl Iterator<Item = AccountId>,
        currency: &CurrencyCode,
        initiator: Initiator,
        entry_type: EntryType,
        account_lookup: A,
        policy: &LedgerPolicy,
    ) -> Result<bool, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        let mut bypassed_frozen = false;
        for account_id in account_ids {
            let info = account_lookup(account_id).ok_or(LedgerError::AccountNotFound(account_id))?;

            if info.currency != *currency {
                return Err(LedgerError::CurrencyMismatch {
                    account_id: info.id,
                    account_currency: info.currency,
                    entry_currency: currency.clone(),
                });
            }

            if info.status == AccountStatus::Frozen {
                if !policy.may_bypass_frozen(initiator, entry_type) {
                    return Err(LedgerError::AccountFrozen {
                        account_id: info.id,
                        entry_type,
                    });
                }
                bypassed_frozen = true;
            }
        }
        Ok(bypassed_frozen)
    }

    /// Sum the debit and credit legs of an entry.
    #[must_use]
    pub fn totals(entry: &NewEntry) -> (Decimal, Decimal) {
        entry.postings.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(debit, credit), p| match p.direction {
                Direction::Debit => (debit + p.amount, credit),
                Direction::Credit => (debit, credit + p.amount),
            },
        )
    }
}
