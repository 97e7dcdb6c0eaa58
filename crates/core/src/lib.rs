//! Core ledger logic for Snel Roi.
//!
//! This crate contains the ledger domain with ZERO web or database dependencies.
//! Storage is reached through the [`ledger::LedgerStore`] trait.
//!
//! # Modules
//!
//! - `ledger` - Accounts, entries, validation, balances and the `Ledger` service
//! - `workflow` - Entry state machine and reversals
//! - `automation` - Automatic deposit approval
//! - `notify` - Customer notification sinks

pub mod automation;
pub mod ledger;
pub mod notify;
pub mod workflow;
