//! `SeaORM` entity definitions.

pub mod accounts;
pub mod ledger_entries;
pub mod ledger_postings;
pub mod sea_orm_active_enums;

pub mod prelude {
    //! Entity re-exports.
    pub use super::accounts::Entity as Accounts;
    pub use super::ledger_entries::Entity as LedgerEntries;
    pub use super::ledger_postings::Entity as LedgerPostings;
}
