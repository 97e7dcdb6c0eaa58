//! Entry lifecycle management.
//!
//! This module implements the entry state machine and the construction
//! of corrective entries for reversals.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (EntryStatus, WorkflowAction)
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic
//! - `reversal` - Reversing entry creation

pub mod error;
pub mod reversal;
pub mod service;
pub mod types;

#[cfg(test)]
mod reversal_props;
#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use reversal::ReversalService;
pub use service::WorkflowService;
pub use types::{EntryStatus, WorkflowAction};
