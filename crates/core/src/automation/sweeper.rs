//! Recovery loop for deposits whose approval task was lost.
//!
//! Scheduled approvals live only in memory. After a restart, deposits that
//! were waiting out their review delay stay PENDING until this sweep finds
//! them.

use chrono::{TimeDelta, Utc};
use snel_shared::types::PageRequest;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::automation::AutoApprovalPolicy;
use crate::ledger::entry::EntryType;
use crate::ledger::error::LedgerError;
use crate::ledger::service::Ledger;
use crate::ledger::store::{EntryFilter, LedgerStore};
use crate::workflow::types::EntryStatus;

/// Entries examined per sweep.
pub const SWEEP_BATCH: u32 = 500;

/// Periodically approves PENDING deposits older than the review delay.
pub struct PendingDepositSweeper<S> {
    ledger: Ledger<S>,
    policy: AutoApprovalPolicy,
}

impl<S: LedgerStore> PendingDepositSweeper<S> {
    /// Creates a sweeper over `ledger`.
    #[must_use]
    pub fn new(ledger: Ledger<S>, policy: AutoApprovalPolicy) -> Self {
        Self { ledger, policy }
    }

    /// Runs one sweep and returns how many deposits it approved.
    ///
    /// At most [`SWEEP_BATCH`] overdue deposits are handled per call; the
    /// next sweep picks up the rest. A failure on one entry is logged and
    /// does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the overdue deposits cannot be listed.
    pub async fn sweep_once(&self) -> Result<usize, LedgerError> {
        if !self.policy.enabled {
            return Ok(0);
        }
        let Some(cutoff) = TimeDelta::from_std(self.policy.delay)
            .ok()
            .and_then(|delay| Utc::now().checked_sub_signed(delay))
        else {
            return Ok(0);
        };

        let filter = EntryFilter::with_status(EntryStatus::Pending)
            .entry_type(EntryType::Deposit)
            .between(None, Some(cutoff));
        let overdue = self
            .ledger
            .feed(&filter, PageRequest::new(1, SWEEP_BATCH))
            .await?;
        if overdue.data.is_empty() {
            return Ok(0);
        }

        let mut approved = 0;
        for entry in &overdue.data {
            match self.ledger.auto_approve(entry.id, entry.created_by).await {
                Ok(Some(_)) => approved += 1,
                Ok(None) => {}
                Err(e) => warn!(entry_id = %entry.id, error = %e, "Sweep failed to approve deposit"),
            }
        }

        info!(
            examined = overdue.data.len(),
            approved,
            "Pending deposit sweep finished"
        );
        Ok(approved)
    }

    /// Runs the sweep loop until `shutdown` is cancelled.
    ///
    /// Returns immediately when the policy disables sweeping. A zero
    /// interval counts as disabled, as it does in configuration.
    pub async fn run(self, shutdown: CancellationToken) {
        let Some(interval) = self
            .policy
            .sweep_interval
            .filter(|interval| self.policy.enabled && !interval.is_zero())
        else {
            debug!("Pending deposit sweeper disabled");
            return;
        };

        info!(interval_secs = interval.as_secs(), "Pending deposit sweeper starting");

        loop {
            if shutdown.is_cancelled() {
                info!("Pending deposit sweeper shutting down");
                return;
            }

            if let Err(e) = self.sweep_once().await {
                warn!(error = %e, "Pending deposit sweep failed");
            }

            tokio::select! {
                () = tokio::time::sleep(interval) => {},
                () = shutdown.cancelled() => {
                    info!("Pending deposit sweeper shutting down");
                    return;
                }
            }
        }
    }
}
