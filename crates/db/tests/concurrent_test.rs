//! Concurrent state transitions against `SeaOrmLedgerStore`.
//!
//! Approvals racing on one entry must commit exactly once; the losers see
//! the status the winner left behind.

mod common;

use common::Bank;
use futures::future::join_all;
use rust_decimal_macros::dec;
use snel_core::ledger::LedgerError;
use snel_core::workflow::EntryStatus;
use snel_shared::types::UserId;

#[tokio::test]
async fn test_concurrent_approvals_commit_once() {
    let bank = Bank::new().await;
    let (_, user, account) = bank.customer().await;
    let entry = bank.deposit(user, &account, dec!(100.00)).await;

    let approvers: Vec<UserId> = (0..8).map(|_| UserId::new()).collect();
    let results = join_all(
        approvers
            .iter()
            .map(|approver| bank.ledger.approve(entry.id, *approver)),
    )
    .await;

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_eq!(
            result.as_ref().err(),
            Some(&LedgerError::InvalidStateTransition {
                from: EntryStatus::Posted,
                to: EntryStatus::Posted,
            })
        );
    }

    let stored = bank.ledger.entry(entry.id).await.unwrap();
    assert_eq!(stored.approved_by, winners[0].approved_by);
    assert_eq!(bank.ledger.balance(account.id).await.unwrap(), dec!(100.00));
}

#[tokio::test]
async fn test_approve_races_decline() {
    let bank = Bank::new().await;
    let (_, user, account) = bank.customer().await;
    let entry = bank.deposit(user, &account, dec!(25.00)).await;

    let (approved, declined) = tokio::join!(
        bank.ledger.approve(entry.id, bank.admin),
        bank.ledger.decline(entry.id, UserId::new()),
    );
    assert!(approved.is_ok() ^ declined.is_ok());

    let stored = bank.ledger.entry(entry.id).await.unwrap();
    let expected = if approved.is_ok() {
        dec!(25.00)
    } else {
        dec!(0)
    };
    assert_eq!(bank.ledger.balance(account.id).await.unwrap(), expected);
    assert_ne!(stored.status, EntryStatus::Pending);
}

#[tokio::test]
async fn test_concurrent_automatic_approvals_are_quiet() {
    let bank = Bank::new().await;
    let (_, user, account) = bank.customer().await;
    let entry = bank.deposit(user, &account, dec!(10.00)).await;

    let results = join_all((0..4).map(|_| bank.ledger.auto_approve(entry.id, user))).await;
    let applied = results
        .into_iter()
        .map(Result::unwrap)
        .filter(Option::is_some)
        .count();
    assert_eq!(applied, 1);
    assert_eq!(bank.ledger.balance(account.id).await.unwrap(), dec!(10.00));
}
