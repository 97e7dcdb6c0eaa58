//! Configurable ledger policy.

use snel_shared::config::LedgerConfig;

use crate::ledger::entry::{EntryType, Initiator};
use crate::ledger::error::LedgerError;

/// Business policy the posting validator honors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPolicy {
    frozen_bypass: Vec<EntryType>,
}

impl LedgerPolicy {
    /// Creates a policy allowing the given entry types past the frozen check.
    #[must_use]
    pub fn new(frozen_bypass: impl IntoIterator<Item = EntryType>) -> Self {
        Self {
            frozen_bypass: frozen_bypass.into_iter().collect(),
        }
    }

    /// Builds the policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if a bypass entry type is unknown.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let frozen_bypass = config
            .frozen_bypass_entry_types
            .iter()
            .map(|name| {
                EntryType::parse(name).ok_or_else(|| {
                    LedgerError::InvalidConfiguration(format!(
                        "unknown entry type in frozen_bypass_entry_types: {name}"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { frozen_bypass })
    }

    /// Entry types that privileged initiators may post against frozen accounts.
    #[must_use]
    pub fn frozen_bypass(&self) -> &[EntryType] {
        &self.frozen_bypass
    }

    /// Returns true if `initiator` may post `entry_type` against a frozen account.
    ///
    /// Customers never bypass. Admins and system processes bypass only for
    /// the configured entry types.
    #[must_use]
    pub fn may_bypass_frozen(&self, initiator: Initiator, entry_type: EntryType) -> bool {
        initiator.role.is_privileged() && self.frozen_bypass.contains(&entry_type)
    }
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self::new([
            EntryType::Transfer,
            EntryType::Adjustment,
            EntryType::Reversal,
        ])
    }
}
