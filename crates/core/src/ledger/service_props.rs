//! Property-based tests for the Ledger service.
//!
//! Random sequences of deposits and transfers are created and then
//! approved, declined or left pending. Afterwards every balance must equal
//! what the approved postings alone imply, and money must be conserved.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use snel_shared::types::{CurrencyCode, CustomerId, UserId};

use super::account::{Account, AccountType};
use super::entry::{EntryDetails, Initiator, NewEntry};
use super::memory::InMemoryLedgerStore;
use super::policy::LedgerPolicy;
use super::service::Ledger;

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Approve,
    Decline,
    Leave,
}

#[derive(Debug, Clone)]
enum Op {
    /// Deposit into customer `to`.
    Deposit { to: usize, cents: i64, outcome: Outcome },
    /// Transfer from customer `from` to customer `to`.
    Transfer { from: usize, to: usize, cents: i64, outcome: Outcome },
}

const CUSTOMERS: usize = 3;

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Approve),
        Just(Outcome::Decline),
        Just(Outcome::Leave),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..CUSTOMERS, 1i64..100_000, arb_outcome())
            .prop_map(|(to, cents, outcome)| Op::Deposit { to, cents, outcome }),
        (0..CUSTOMERS, 0..CUSTOMERS, 1i64..100_000, arb_outcome()).prop_map(
            |(from, to, cents, outcome)| Op::Transfer { from, to, cents, outcome }
        ),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

struct Expected {
    committed: [Decimal; CUSTOMERS],
    pending: [Decimal; CUSTOMERS],
}

async fn run(ops: Vec<Op>) -> (Vec<Decimal>, Vec<Decimal>, Decimal, Expected) {
    let ghs = CurrencyCode::parse("GHS").unwrap();
    let ledger = Ledger::new(Arc::new(InMemoryLedgerStore::new()), LedgerPolicy::default());
    let funding = ledger.open_system_account("SYS-0001", ghs.clone()).await.unwrap();
    let admin = UserId::new();

    let mut accounts: Vec<Account> = Vec::new();
    for _ in 0..CUSTOMERS {
        accounts.push(
            ledger
                .create_account(CustomerId::new(), AccountType::Checking, ghs.clone())
                .await
                .unwrap(),
        );
    }

    let mut expected = Expected {
        committed: [Decimal::ZERO; CUSTOMERS],
        pending: [Decimal::ZERO; CUSTOMERS],
    };

    for op in ops {
        let (entry, legs, outcome) = match op {
            Op::Deposit { to, cents, outcome } => {
                let amount = Decimal::new(cents, 2);
                let entry = NewEntry::new(
                    EntryDetails::Deposit,
                    Initiator::customer(UserId::new()),
                    ghs.clone(),
                )
                .debit(funding.id, amount)
                .credit(accounts[to].id, amount);
                (entry, vec![(to, amount)], outcome)
            }
            Op::Transfer { from, to, cents, outcome } => {
                if from == to {
                    continue;
                }
                let amount = Decimal::new(cents, 2);
                let entry = NewEntry::new(
                    EntryDetails::Transfer,
                    Initiator::customer(UserId::new()),
                    ghs.clone(),
                )
                .debit(accounts[from].id, amount)
                .credit(accounts[to].id, amount);
                (entry, vec![(from, -amount), (to, amount)], outcome)
            }
        };

        let created = ledger.create_entry(entry).await.unwrap();
        match outcome {
            Outcome::Approve => {
                ledger.approve(created.id, admin).await.unwrap();
                for (idx, delta) in legs {
                    expected.committed[idx] += delta;
                }
            }
            Outcome::Decline => {
                ledger.decline(created.id, admin).await.unwrap();
            }
            Outcome::Leave => {
                for (idx, delta) in legs {
                    expected.pending[idx] += delta;
                }
            }
        }
    }

    let mut balances = Vec::new();
    let mut pending = Vec::new();
    for account in &accounts {
        balances.push(ledger.balance(account.id).await.unwrap());
        pending.push(ledger.pending_balance(account.id).await.unwrap());
    }
    let funding_balance = ledger.balance(funding.id).await.unwrap();
    (balances, pending, funding_balance, expected)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balances reflect approved postings only; pending balances reflect pending ones.
    #[test]
    fn prop_balances_follow_approvals(ops in prop::collection::vec(arb_op(), 0..25)) {
        let (balances, pending, _, expected) = runtime().block_on(run(ops));
        for idx in 0..CUSTOMERS {
            prop_assert_eq!(balances[idx], expected.committed[idx]);
            prop_assert_eq!(pending[idx], expected.pending[idx]);
        }
    }

    /// The funding account mirrors every approved deposit, so the ledger nets to zero.
    #[test]
    fn prop_ledger_nets_to_zero(ops in prop::collection::vec(arb_op(), 0..25)) {
        let (balances, _, funding_balance, _) = runtime().block_on(run(ops));
        let customers: Decimal = balances.iter().copied().sum();
        prop_assert_eq!(customers + funding_balance, Decimal::ZERO);
    }
}
