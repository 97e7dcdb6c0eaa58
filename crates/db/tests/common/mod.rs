//! Shared setup for store integration tests.
//!
//! Every test gets its own in-process SQLite database with the real
//! migrations applied. `sqlite::memory:` is per connection, so the pool is
//! pinned to a single connection.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;

use snel_core::ledger::{
    Account, AccountType, EntryDetails, Initiator, Ledger, LedgerEntry, LedgerPolicy, NewEntry,
};
use snel_db::{SeaOrmLedgerStore, connect, migration::Migrator};
use snel_shared::config::DatabaseConfig;
use snel_shared::types::{CurrencyCode, CustomerId, UserId};

pub fn ghs() -> CurrencyCode {
    CurrencyCode::parse("GHS").unwrap()
}

pub async fn database() -> DatabaseConnection {
    let config = DatabaseConfig {
        max_connections: 1,
        min_connections: 1,
        ..DatabaseConfig::new("sqlite::memory:")
    };
    let db = connect(&config).await.expect("Failed to open SQLite database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");
    db
}

pub struct Bank {
    pub ledger: Ledger<SeaOrmLedgerStore>,
    pub funding: Account,
    pub payout: Account,
    pub admin: UserId,
}

impl Bank {
    pub async fn new() -> Self {
        Self::over(database().await, "SYS-0001", "SYS-0002").await
    }

    /// A bank over an existing database with its own system account numbers.
    pub async fn over(db: DatabaseConnection, funding: &str, payout: &str) -> Self {
        let store = SeaOrmLedgerStore::new(db);
        let ledger = Ledger::new(Arc::new(store), LedgerPolicy::default());
        let funding = ledger.open_system_account(funding, ghs()).await.unwrap();
        let payout = ledger.open_system_account(payout, ghs()).await.unwrap();
        Self {
            ledger,
            funding,
            payout,
            admin: UserId::new(),
        }
    }

    pub async fn customer(&self) -> (CustomerId, UserId, Account) {
        let customer = CustomerId::new();
        let account = self
            .ledger
            .create_account(customer, AccountType::Checking, ghs())
            .await
            .unwrap();
        (customer, UserId::from_uuid(customer.into_inner()), account)
    }

    pub async fn deposit(&self, user: UserId, account: &Account, amount: Decimal) -> LedgerEntry {
        self.ledger
            .create_entry(
                NewEntry::new(EntryDetails::Deposit, Initiator::customer(user), ghs())
                    .memo("cash deposit")
                    .debit(self.funding.id, amount)
                    .credit(account.id, amount),
            )
            .await
            .unwrap()
    }

    pub async fn transfer(
        &self,
        user: UserId,
        from: &Account,
        to: &Account,
        amount: Decimal,
    ) -> LedgerEntry {
        self.ledger
            .create_entry(
                NewEntry::new(EntryDetails::Transfer, Initiator::customer(user), ghs())
                    .debit(from.id, amount)
                    .credit(to.id, amount),
            )
            .await
            .unwrap()
    }

    pub async fn funded(&self, amount: Decimal) -> (CustomerId, UserId, Account) {
        let (customer, user, account) = self.customer().await;
        let entry = self.deposit(user, &account, amount).await;
        self.ledger.approve(entry.id, self.admin).await.unwrap();
        (customer, user, account)
    }
}
