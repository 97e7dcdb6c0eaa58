//! Snel Roi ledger daemon.
//!
//! Applies migrations, provisions the system accounts and runs the pending
//! deposit sweeper until interrupted. Domain services embed `snel-core` and
//! `snel-db` directly; the daemon opens no network listener.

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use snel_core::automation::{AutoApprovalPolicy, PendingDepositSweeper};
use snel_core::ledger::{Ledger, LedgerPolicy, SystemAccountResolver};
use snel_core::notify::TracingNotificationSink;
use snel_db::{SeaOrmLedgerStore, connect, migration::Migrator};
use snel_shared::{AppConfig, AppError};
use snel_shared::config::LogConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(AppError::from)?;
    init_tracing(&config.log);

    let db = connect(&config.database).await?;
    info!("Connected to database");

    if config.database.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    let policy = LedgerPolicy::from_config(&config.ledger).map_err(AppError::from)?;
    let ledger = Ledger::new(Arc::new(SeaOrmLedgerStore::new(db)), policy)
        .with_sink(Arc::new(TracingNotificationSink));

    let resolver = SystemAccountResolver::from_config(&config.ledger).map_err(AppError::from)?;
    resolver.resolve(&ledger).await.map_err(AppError::from)?;

    let automation = AutoApprovalPolicy::from_config(&config.automation);
    info!(
        auto_approve = automation.enabled,
        review_delay_secs = automation.delay.as_secs(),
        "Automation configured"
    );

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(PendingDepositSweeper::new(ledger, automation).run(shutdown.clone()));

    info!("Ledger daemon running");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    shutdown.cancel();
    sweeper.await?;
    info!("Ledger daemon stopped");
    Ok(())
}

fn init_tracing(config: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
