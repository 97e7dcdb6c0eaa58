//! Property-based tests for derived balances.
//!
//! The balance of an account is credits minus debits over committed
//! entries, and is unaffected by PENDING or DECLINED entries.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use snel_shared::types::{AccountId, CurrencyCode, EntryId, PostingId, UserId};
use uuid::Uuid;

use super::balance::{BalanceSums, PostingSums, Statement, StatementPosting, StatementSnapshot};
use super::entry::{Direction, EntryDetails, EntryType, InitiatorRole, LedgerEntry, LedgerPosting};
use crate::workflow::types::EntryStatus;

fn arb_status() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::Pending),
        Just(EntryStatus::Posted),
        Just(EntryStatus::Declined),
        Just(EntryStatus::Reversed),
    ]
}

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Debit), Just(Direction::Credit)]
}

/// Two-leg entries between a fixed pair of accounts, in random directions.
fn arb_entries(a: AccountId, b: AccountId) -> impl Strategy<Value = Vec<LedgerEntry>> {
    prop::collection::vec((arb_status(), arb_direction(), arb_amount()), 0..20).prop_map(
        move |specs| {
            specs
                .into_iter()
                .map(|(status, direction, amount)| {
                    let id = EntryId::new();
                    let leg = |account_id, direction| LedgerPosting {
                        id: PostingId::new(),
                        entry_id: id,
                        account_id,
                        direction,
                        amount,
                        description: String::new(),
                    };
                    LedgerEntry {
                        id,
                        reference: "000000000000".to_string(),
                        details: EntryDetails::Transfer,
                        currency: CurrencyCode::parse("GHS").unwrap(),
                        created_by: UserId::new(),
                        initiated_as: InitiatorRole::Customer,
                        created_at: Utc::now(),
                        status,
                        approved_by: None,
                        approved_at: None,
                        memo: String::new(),
                        postings: vec![leg(a, direction), leg(b, direction.opposite())],
                    }
                })
                .collect()
        },
    )
}

fn pair() -> (AccountId, AccountId) {
    (
        AccountId::from_uuid(Uuid::from_u128(1)),
        AccountId::from_uuid(Uuid::from_u128(2)),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balance equals credits minus debits of committed entries only.
    #[test]
    fn prop_balance_counts_committed_only(entries in arb_entries(pair().0, pair().1)) {
        let (a, _) = pair();
        let expected: Decimal = entries
            .iter()
            .filter(|e| matches!(e.status, EntryStatus::Posted | EntryStatus::Reversed))
            .flat_map(|e| &e.postings)
            .filter(|p| p.account_id == a)
            .map(LedgerPosting::signed_amount)
            .sum();
        prop_assert_eq!(BalanceSums::from_entries(&entries, a).committed.net(), expected);
    }

    /// Adding pending or declined entries never moves the committed balance.
    #[test]
    fn prop_uncommitted_entries_do_not_move_balance(
        entries in arb_entries(pair().0, pair().1),
        extra in arb_entries(pair().0, pair().1),
    ) {
        let (a, _) = pair();
        let before = BalanceSums::from_entries(&entries, a).committed;
        let uncommitted = extra
            .into_iter()
            .filter(|e| matches!(e.status, EntryStatus::Pending | EntryStatus::Declined));
        let all: Vec<_> = entries.into_iter().chain(uncommitted).collect();
        prop_assert_eq!(BalanceSums::from_entries(&all, a).committed, before);
    }

    /// Money is conserved: the two accounts' committed balances are opposite.
    #[test]
    fn prop_balances_are_conserved(entries in arb_entries(pair().0, pair().1)) {
        let (a, b) = pair();
        let net_a = BalanceSums::from_entries(&entries, a).committed.net();
        let net_b = BalanceSums::from_entries(&entries, b).committed.net();
        prop_assert_eq!(net_a + net_b, Decimal::ZERO);
    }

    /// The closing balance equals the opening balance plus every signed line.
    #[test]
    fn prop_statement_closing_balance(
        opening_debit in arb_amount(),
        opening_credit in arb_amount(),
        legs in prop::collection::vec((arb_direction(), arb_amount()), 0..30),
    ) {
        let from = Utc::now() - Duration::days(7);
        let postings: Vec<_> = legs
            .iter()
            .map(|(direction, amount)| StatementPosting {
                entry_id: EntryId::new(),
                reference: "000000000000".to_string(),
                entry_type: EntryType::Transfer,
                created_at: from,
                direction: *direction,
                amount: *amount,
                description: String::new(),
            })
            .collect();
        let opening = PostingSums { debit: opening_debit, credit: opening_credit };
        let statement = Statement::build(
            AccountId::new(),
            CurrencyCode::parse("GHS").unwrap(),
            from,
            Utc::now(),
            StatementSnapshot { opening, postings },
        );

        let change: Decimal = legs.iter().map(|(d, amount)| d.signed(*amount)).sum();
        prop_assert_eq!(statement.closing_balance, opening.net() + change);

        let mut previous = statement.opening_balance;
        for line in &statement.lines {
            prop_assert_eq!(
                line.running_balance,
                previous + line.posting.direction.signed(line.posting.amount)
            );
            previous = line.running_balance;
        }
    }
}
