//! Database layer with `SeaORM` entities and the ledger store.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories for accounts and entries
//! - Database migrations
//! - [`SeaOrmLedgerStore`], the production `LedgerStore`

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod store;

pub use store::SeaOrmLedgerStore;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use snel_shared::config::DatabaseConfig;

/// Establishes a pooled connection to the database.
///
/// For `sqlite::memory:` each pooled connection is a separate database, so
/// callers set `max_connections = 1`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    Database::connect(options).await
}
