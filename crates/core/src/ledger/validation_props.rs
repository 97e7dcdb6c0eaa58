//! Property-based tests for posting validation rules.
//!
//! Every accepted entry is balanced to the cent, and every unbalanced,
//! non-positive or over-precise posting set is rejected before any account
//! is consulted.

use proptest::prelude::*;
use rust_decimal::Decimal;
use snel_shared::types::{AccountId, CurrencyCode, UserId};
use uuid::Uuid;

use super::account::AccountStatus;
use super::entry::{EntryDetails, Initiator, NewEntry};
use super::error::LedgerError;
use super::policy::LedgerPolicy;
use super::validation::{AccountInfo, PostingValidator};

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a split of a total into 1-4 positive parts.
fn split_amounts() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(positive_amount(), 1..5)
}

fn ghs() -> CurrencyCode {
    CurrencyCode::parse("GHS").unwrap()
}

/// Lookup where every account exists, is active and is in GHS.
fn active_ghs(id: AccountId) -> Option<AccountInfo> {
    Some(AccountInfo {
        id,
        currency: ghs(),
        status: AccountStatus::Active,
    })
}

fn arb_account() -> impl Strategy<Value = AccountId> {
    any::<u128>().prop_map(|n| AccountId::from_uuid(Uuid::from_u128(n)))
}

/// Builds a transfer with one debit leg covering all credit legs.
fn split_transfer(debit_account: AccountId, credits: &[Decimal]) -> NewEntry {
    let total: Decimal = credits.iter().copied().sum();
    let mut entry = NewEntry::new(
        EntryDetails::Transfer,
        Initiator::customer(UserId::new()),
        ghs(),
    )
    .debit(debit_account, total);
    for amount in credits {
        entry = entry.credit(AccountId::new(), *amount);
    }
    entry
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any debit split across any number of credits validates with equal totals.
    #[test]
    fn prop_balanced_splits_accepted(account in arb_account(), credits in split_amounts()) {
        let entry = split_transfer(account, &credits);
        let validated = PostingValidator::validate(&entry, active_ghs, &LedgerPolicy::default())
            .unwrap();
        prop_assert_eq!(validated.total_debit, validated.total_credit);
        prop_assert_eq!(validated.total_credit, credits.iter().copied().sum::<Decimal>());
    }

    /// Nudging one leg by any non-zero number of cents is rejected as unbalanced.
    #[test]
    fn prop_imbalance_rejected(
        credits in split_amounts(),
        nudge in prop_oneof![-1000i64..0, 1i64..1000],
    ) {
        let mut entry = split_transfer(AccountId::new(), &credits);
        let leg = &mut entry.postings[0];
        leg.amount += Decimal::new(nudge, 2);
        prop_assume!(leg.amount > Decimal::ZERO);

        let result = PostingValidator::validate(&entry, active_ghs, &LedgerPolicy::default());
        let is_unbalanced = matches!(result, Err(LedgerError::UnbalancedPostings { .. }));
        prop_assert!(is_unbalanced, "expected UnbalancedPostings, got {:?}", result);
    }

    /// A zero or negative leg is rejected even when the set balances.
    #[test]
    fn prop_non_positive_rejected(cents in 0i64..100_000i64) {
        let amount = Decimal::new(-cents, 2);
        let entry = NewEntry::new(EntryDetails::Transfer, Initiator::customer(UserId::new()), ghs())
            .debit(AccountId::new(), amount)
            .credit(AccountId::new(), amount);
        let result = PostingValidator::validate(&entry, active_ghs, &LedgerPolicy::default());
        prop_assert_eq!(result, Err(LedgerError::InvalidAmount { amount }));
    }

    /// Amounts with a third significant decimal place are never rounded into acceptance.
    #[test]
    fn prop_sub_cent_rejected(mills in 1i64..10_000_000i64) {
        prop_assume!(mills % 10 != 0);
        let amount = Decimal::new(mills, 3);
        let entry = NewEntry::new(EntryDetails::Transfer, Initiator::customer(UserId::new()), ghs())
            .debit(AccountId::new(), amount)
            .credit(AccountId::new(), amount);
        let result = PostingValidator::validate(&entry, active_ghs, &LedgerPolicy::default());
        let is_precision = matches!(result, Err(LedgerError::PrecisionExceeded { .. }));
        prop_assert!(is_precision, "expected PrecisionExceeded, got {:?}", result);
    }

    /// Structural rules are decided before the account lookup is ever called.
    #[test]
    fn prop_structural_errors_skip_lookup(credits in split_amounts()) {
        let mut entry = split_transfer(AccountId::new(), &credits);
        entry.postings[0].amount += Decimal::new(1, 2);
        let result = PostingValidator::validate(
            &entry,
            |_| -> Option<AccountInfo> { panic!("lookup must not run") },
            &LedgerPolicy::default(),
        );
        prop_assert!(result.is_err());
    }
}
