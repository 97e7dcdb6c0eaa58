//! Automatic approval of plain deposits.
//!
//! Two paths approve deposits without a human reviewer:
//!
//! - [`AutoApprovalScheduler`] spawns a delayed task per new deposit.
//! - [`PendingDepositSweeper`] periodically approves deposits that outlived
//!   their review delay, covering tasks lost to a restart.
//!
//! Both treat an entry that already left PENDING as a silent no-op.

pub mod scheduler;
pub mod sweeper;

use std::time::Duration;

use snel_shared::config::AutomationConfig;

use crate::ledger::entry::{EntryType, LedgerEntry};
use crate::workflow::types::EntryStatus;

pub use scheduler::AutoApprovalScheduler;
pub use sweeper::PendingDepositSweeper;

/// When and how deposits are approved automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoApprovalPolicy {
    /// Master switch.
    pub enabled: bool,
    /// Review window before a deposit is approved.
    pub delay: Duration,
    /// Sweep interval. `None` disables the sweeper.
    pub sweep_interval: Option<Duration>,
}

impl AutoApprovalPolicy {
    /// Builds the policy from configuration.
    #[must_use]
    pub fn from_config(config: &AutomationConfig) -> Self {
        Self {
            enabled: config.auto_approve_deposits,
            delay: Duration::from_secs(config.review_delay_secs),
            sweep_interval: (config.sweep_interval_secs > 0)
                .then(|| Duration::from_secs(config.sweep_interval_secs)),
        }
    }

    /// A policy that never approves anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            delay: Duration::ZERO,
            sweep_interval: None,
        }
    }

    /// Returns true if `entry` is a pending plain deposit and automation is on.
    #[must_use]
    pub fn applies_to(&self, entry: &LedgerEntry) -> bool {
        self.enabled && entry.status == EntryStatus::Pending && entry.entry_type() == EntryType::Deposit
    }
}

impl Default for AutoApprovalPolicy {
    fn default() -> Self {
        Self::from_config(&AutomationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_policy_from_default_config() {
        let policy = AutoApprovalPolicy::default();
        assert!(policy.enabled);
        assert_eq!(policy.delay, Duration::from_secs(5));
        assert_eq!(policy.sweep_interval, Some(Duration::from_secs(60)));
    }

    #[rstest]
    #[case(0, None)]
    #[case(30, Some(Duration::from_secs(30)))]
    fn test_zero_interval_disables_sweep(#[case] secs: u64, #[case] expected: Option<Duration>) {
        let config = AutomationConfig {
            sweep_interval_secs: secs,
            ..AutomationConfig::default()
        };
        assert_eq!(AutoApprovalPolicy::from_config(&config).sweep_interval, expected);
    }

    #[test]
    fn test_disabled_policy() {
        let policy = AutoApprovalPolicy::disabled();
        assert!(!policy.enabled);
        assert!(policy.sweep_interval.is_none());
    }
}
