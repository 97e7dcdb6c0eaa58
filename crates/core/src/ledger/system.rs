//! System account resolution.
//!
//! The funding and payout accounts are the counter-party of every inflow
//! and outflow that has no paired customer account. They are resolved once
//! at startup and handed to domain services as a plain value.

use serde::{Deserialize, Serialize};
use snel_shared::config::LedgerConfig;
use snel_shared::types::CurrencyCode;
use tokio::sync::OnceCell;
use tracing::info;

use crate::ledger::account::Account;
use crate::ledger::error::LedgerError;
use crate::ledger::service::Ledger;
use crate::ledger::store::LedgerStore;

/// The bank's fixed counter-party accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemAccounts {
    /// Debited by deposits and disbursements.
    pub funding: Account,
    /// Credited by withdrawals and repayments.
    pub payout: Account,
}

/// Get-or-creates the system accounts and caches them.
#[derive(Debug)]
pub struct SystemAccountResolver {
    funding_number: String,
    payout_number: String,
    currency: CurrencyCode,
    resolved: OnceCell<SystemAccounts>,
}

impl SystemAccountResolver {
    /// Creates a resolver for explicit account numbers.
    #[must_use]
    pub fn new(
        funding_number: impl Into<String>,
        payout_number: impl Into<String>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            funding_number: funding_number.into(),
            payout_number: payout_number.into(),
            currency,
            resolved: OnceCell::new(),
        }
    }

    /// Creates a resolver from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for a bad currency, a blank number or
    /// identical funding and payout numbers.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let currency = CurrencyCode::parse(&config.system_currency)
            .map_err(|e| LedgerError::InvalidConfiguration(e.to_string()))?;
        let funding = config.funding_account_number.trim();
        let payout = config.payout_account_number.trim();
        if funding.is_empty() || payout.is_empty() {
            return Err(LedgerError::InvalidConfiguration(
                "system account numbers must not be blank".to_string(),
            ));
        }
        if funding == payout {
            return Err(LedgerError::InvalidConfiguration(format!(
                "funding and payout accounts share number {funding}"
            )));
        }
        Ok(Self::new(funding, payout, currency))
    }

    /// Returns the system accounts, provisioning them on first use.
    ///
    /// Concurrent first calls run the provisioning once; every later call
    /// returns the cached value. A failed attempt is not cached.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccount` if a configured number belongs to a
    /// non-system account, or `Storage`.
    pub async fn resolve<S: LedgerStore>(
        &self,
        ledger: &Ledger<S>,
    ) -> Result<&SystemAccounts, LedgerError> {
        self.resolved
            .get_or_try_init(|| async {
                let funding = ledger
                    .open_system_account(&self.funding_number, self.currency.clone())
                    .await?;
                let payout = ledger
                    .open_system_account(&self.payout_number, self.currency.clone())
                    .await?;
                info!(
                    funding = %funding.account_number,
                    payout = %payout.account_number,
                    currency = %self.currency,
                    "System accounts resolved"
                );
                Ok(SystemAccounts { funding, payout })
            })
            .await
    }

    /// The cached accounts, if already resolved.
    #[must_use]
    pub fn get(&self) -> Option<&SystemAccounts> {
        self.resolved.get()
    }
}
