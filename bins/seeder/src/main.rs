//! Provisions the funding and payout system accounts.
//!
//! Safe to run repeatedly: existing accounts are reported, not recreated.
//!
//! Usage: cargo run --bin seed-system

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use snel_core::ledger::{Account, Ledger, LedgerPolicy, SystemAccountResolver};
use snel_db::{SeaOrmLedgerStore, connect, migration::Migrator};
use snel_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = connect(&config.database).await?;

    if config.database.run_migrations {
        println!("Applying migrations...");
        Migrator::up(&db, None).await?;
    }

    let ledger = Ledger::new(
        Arc::new(SeaOrmLedgerStore::new(db)),
        LedgerPolicy::from_config(&config.ledger)?,
    );
    let resolver = SystemAccountResolver::from_config(&config.ledger)?;

    println!("Provisioning system accounts...");
    let accounts = resolver.resolve(&ledger).await?;
    report("Funding", &accounts.funding);
    report("Payout", &accounts.payout);

    println!("Seeding complete!");
    Ok(())
}

fn report(role: &str, account: &Account) {
    println!(
        "  {role}: {} ({}, {}, {})",
        account.account_number, account.currency, account.status, account.id
    );
}
