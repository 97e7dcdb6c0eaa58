//! Double-entry ledger.
//!
//! This module implements the core ledger functionality:
//! - Accounts and their lifecycle
//! - Entries, postings and reference generation
//! - Posting validation and the frozen-account policy
//! - Balance, activity and statement calculations
//! - The storage seam and an in-memory store
//! - The `Ledger` service that ties them together
//! - System account resolution

pub mod account;
pub mod balance;
pub mod entry;
pub mod error;
pub mod memory;
pub mod policy;
pub mod reference;
pub mod service;
pub mod store;
pub mod system;
pub mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use account::{Account, AccountOwner, AccountStatus, AccountType};
pub use balance::{BalanceSummary, Statement};
pub use entry::{
    Direction, EntryDetails, EntryType, Initiator, InitiatorRole, LedgerEntry, LedgerPosting,
    NewEntry, PostingInput,
};
pub use error::LedgerError;
pub use memory::InMemoryLedgerStore;
pub use policy::LedgerPolicy;
pub use service::{Ledger, ReversedEntry};
pub use store::{EntryFilter, LedgerStore};
pub use system::{SystemAccountResolver, SystemAccounts};
pub use validation::{AccountInfo, PostingValidator};
