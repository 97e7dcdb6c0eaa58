//! Notification sinks for ledger events.
//!
//! Sinks are fire-and-forget. `notify` never blocks and never fails, so a
//! slow or broken consumer cannot affect a committed ledger operation.

use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use snel_shared::types::{AccountId, CustomerId, EntryId};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::ledger::account::AccountStatus;
use crate::ledger::entry::EntryType;
use crate::workflow::types::EntryStatus;

/// Event emitted after a committed ledger change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerNotification {
    /// An entry touching one of the customer's accounts changed status.
    EntryStatusChanged {
        /// Customer to notify.
        customer: CustomerId,
        /// The customer's account touched by the entry.
        account_id: AccountId,
        /// The entry.
        entry_id: EntryId,
        /// Entry type.
        entry_type: EntryType,
        /// Entry amount.
        amount: Decimal,
        /// Status after the change.
        new_status: EntryStatus,
    },
    /// An admin froze or unfroze one of the customer's accounts.
    AccountStatusChanged {
        /// Customer to notify.
        customer: CustomerId,
        /// The account.
        account_id: AccountId,
        /// Status after the change.
        new_status: AccountStatus,
    },
}

impl LedgerNotification {
    /// Customer the notification is addressed to.
    #[must_use]
    pub fn customer(&self) -> CustomerId {
        match self {
            Self::EntryStatusChanged { customer, .. } | Self::AccountStatusChanged { customer, .. } => {
                *customer
            }
        }
    }
}

/// Receiver of ledger notifications.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification without blocking.
    fn notify(&self, notification: LedgerNotification);
}

/// Sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotificationSink;

impl NotificationSink for NoopNotificationSink {
    fn notify(&self, _notification: LedgerNotification) {}
}

/// Sink that logs every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: LedgerNotification) {
        match notification {
            LedgerNotification::EntryStatusChanged {
                customer,
                entry_id,
                entry_type,
                amount,
                new_status,
                ..
            } => info!(
                customer = %customer,
                entry_id = %entry_id,
                entry_type = %entry_type,
                amount = %amount,
                status = %new_status,
                "Entry status notification"
            ),
            LedgerNotification::AccountStatusChanged {
                customer,
                account_id,
                new_status,
            } => info!(
                customer = %customer,
                account_id = %account_id,
                status = %new_status,
                "Account status notification"
            ),
        }
    }
}

/// Sink that forwards notifications to a bounded channel.
///
/// A full or closed channel drops the notification with a warning.
#[derive(Debug, Clone)]
pub struct ChannelNotificationSink {
    sender: mpsc::Sender<LedgerNotification>,
}

impl ChannelNotificationSink {
    /// Creates a sink and the receiver its consumer drains.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LedgerNotification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn notify(&self, notification: LedgerNotification) {
        if let Err(err) = self.sender.try_send(notification) {
            let customer = match &err {
                mpsc::error::TrySendError::Full(n) | mpsc::error::TrySendError::Closed(n) => {
                    n.customer()
                }
            };
            warn!(customer = %customer, error = %err, "Dropping ledger notification");
        }
    }
}

/// Sink that keeps notifications in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryNotificationSink {
    notifications: Mutex<Vec<LedgerNotification>>,
}

impl MemoryNotificationSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything received so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<LedgerNotification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for MemoryNotificationSink {
    fn notify(&self, notification: LedgerNotification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}
