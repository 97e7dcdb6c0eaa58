//! Property-based tests for ReversalService.
//!
//! A reversal must negate the original exactly: per account, the original
//! postings plus the corrective postings sum to zero.

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use snel_shared::types::{AccountId, CurrencyCode, EntryId, PostingId, UserId};
use uuid::Uuid;

use crate::ledger::entry::{
    Direction, EntryDetails, Initiator, InitiatorRole, LedgerEntry, LedgerPosting,
};
use crate::workflow::reversal::ReversalService;
use crate::workflow::types::EntryStatus;

/// Strategy for generating random account ids.
fn arb_account() -> impl Strategy<Value = AccountId> {
    any::<u128>().prop_map(|n| AccountId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a balanced posted entry: one debit split across 1-3 credits.
fn arb_posted_entry() -> impl Strategy<Value = LedgerEntry> {
    (
        arb_account(),
        prop::collection::vec((arb_account(), arb_amount()), 1..4),
    )
        .prop_map(|(debit_account, credits)| {
            let id = EntryId::new();
            let total: Decimal = credits.iter().map(|(_, amount)| *amount).sum();
            let mut postings = vec![LedgerPosting {
                id: PostingId::new(),
                entry_id: id,
                account_id: debit_account,
                direction: Direction::Debit,
                amount: total,
                description: String::new(),
            }];
            postings.extend(credits.into_iter().map(|(account_id, amount)| LedgerPosting {
                id: PostingId::new(),
                entry_id: id,
                account_id,
                direction: Direction::Credit,
                amount,
                description: "split".to_string(),
            }));
            LedgerEntry {
                id,
                reference: "0123456789AB".to_string(),
                details: EntryDetails::Transfer,
                currency: CurrencyCode::parse("GHS").unwrap(),
                created_by: UserId::new(),
                initiated_as: InitiatorRole::Customer,
                created_at: Utc::now(),
                status: EntryStatus::Posted,
                approved_by: None,
                approved_at: None,
                memo: String::new(),
                postings,
            }
        })
}

fn net_by_account(
    entries: impl IntoIterator<Item = (AccountId, Direction, Decimal)>,
) -> HashMap<AccountId, Decimal> {
    let mut net = HashMap::new();
    for (account, direction, amount) in entries {
        *net.entry(account).or_insert(Decimal::ZERO) += direction.signed(amount);
    }
    net
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Original plus reversal nets to zero on every account.
    #[test]
    fn prop_reversal_negates_original(original in arb_posted_entry()) {
        let reversal = ReversalService::reversing_entry(
            &original,
            Initiator::admin(UserId::new()),
            "duplicate",
        )
        .unwrap();

        let legs = original
            .postings
            .iter()
            .map(|p| (p.account_id, p.direction, p.amount))
            .chain(reversal.postings.iter().map(|p| (p.account_id, p.direction, p.amount)));

        for (_, net) in net_by_account(legs) {
            prop_assert_eq!(net, Decimal::ZERO);
        }
    }

    /// The reversal keeps leg count, accounts and amounts, and flips every direction.
    #[test]
    fn prop_reversal_mirrors_legs(original in arb_posted_entry()) {
        let reversal = ReversalService::reversing_entry(
            &original,
            Initiator::system(UserId::new()),
            "clear all",
        )
        .unwrap();

        prop_assert_eq!(reversal.postings.len(), original.postings.len());
        for (orig, rev) in original.postings.iter().zip(&reversal.postings) {
            prop_assert_eq!(orig.account_id, rev.account_id);
            prop_assert_eq!(orig.amount, rev.amount);
            prop_assert_eq!(orig.direction.opposite(), rev.direction);
        }
        prop_assert_eq!(&reversal.currency, &original.currency);
    }

    /// Posted entries built from balanced legs always pass the balance check.
    #[test]
    fn prop_generated_entries_are_balanced(original in arb_posted_entry()) {
        prop_assert!(ReversalService::is_balanced(&original.postings));
    }
}
