//! Shared types, errors, and configuration for the Snel Roi ledger.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes and the fixed decimal scale of amounts
//! - Typed IDs for type-safe entity references
//! - Pagination types for feed queries
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
