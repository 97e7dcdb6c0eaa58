//! Delayed approval of individual deposits.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::automation::AutoApprovalPolicy;
use crate::ledger::entry::LedgerEntry;
use crate::ledger::service::Ledger;
use crate::ledger::store::LedgerStore;

/// Spawns one delayed approval task per eligible deposit.
pub struct AutoApprovalScheduler<S> {
    ledger: Ledger<S>,
    policy: AutoApprovalPolicy,
}

impl<S: LedgerStore + 'static> AutoApprovalScheduler<S> {
    /// Creates a scheduler over `ledger`.
    #[must_use]
    pub fn new(ledger: Ledger<S>, policy: AutoApprovalPolicy) -> Self {
        Self { ledger, policy }
    }

    /// Returns the policy in effect.
    #[must_use]
    pub fn policy(&self) -> &AutoApprovalPolicy {
        &self.policy
    }

    /// Schedules automatic approval of `entry` after the review delay.
    ///
    /// Returns `None` without spawning anything for entries the policy does
    /// not cover. The task approves on behalf of the entry's creator and
    /// reports failures through the log only.
    pub fn schedule(&self, entry: &LedgerEntry) -> Option<JoinHandle<()>> {
        if !self.policy.applies_to(entry) {
            debug!(entry_id = %entry.id, entry_type = %entry.entry_type(), "Not eligible for automatic approval");
            return None;
        }

        let ledger = self.ledger.clone();
        let delay = self.policy.delay;
        let entry_id = entry.id;
        let approver = entry.created_by;
        debug!(entry_id = %entry_id, delay_ms = delay.as_millis(), "Automatic approval scheduled");

        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match ledger.auto_approve(entry_id, approver).await {
                Ok(Some(_)) => info!(entry_id = %entry_id, "Deposit approved automatically"),
                Ok(None) => debug!(entry_id = %entry_id, "Deposit already settled"),
                Err(e) => warn!(entry_id = %entry_id, error = %e, "Automatic approval failed"),
            }
        }))
    }
}
