//! Common types used across the ledger.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{CurrencyCode, FIAT_SCALE, InvalidCurrencyCode, fits_scale};
pub use pagination::{PageMeta, PageRequest, PageResponse};
