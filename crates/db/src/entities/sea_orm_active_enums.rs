//! `SeaORM` active enums, stored as strings.
//!
//! Each enum mirrors a `snel-core` type and converts both ways.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use snel_core::ledger::account::{AccountStatus as CoreAccountStatus, AccountType as CoreAccountType};
use snel_core::ledger::entry::{
    Direction as CoreDirection, EntryType as CoreEntryType, InitiatorRole as CoreInitiatorRole,
};
use snel_core::workflow::types::EntryStatus as CoreEntryStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AccountType {
    #[sea_orm(string_value = "CHECKING")]
    Checking,
    #[sea_orm(string_value = "SAVINGS")]
    Savings,
    #[sea_orm(string_value = "FIXED_DEPOSIT")]
    FixedDeposit,
    #[sea_orm(string_value = "CURRENT")]
    Current,
    #[sea_orm(string_value = "BUSINESS")]
    Business,
    #[sea_orm(string_value = "INVESTMENT")]
    Investment,
    #[sea_orm(string_value = "SYSTEM")]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AccountStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "FROZEN")]
    Frozen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OwnerKind {
    #[sea_orm(string_value = "CUSTOMER")]
    Customer,
    #[sea_orm(string_value = "SYSTEM")]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum EntryStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "POSTED")]
    Posted,
    #[sea_orm(string_value = "DECLINED")]
    Declined,
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum EntryType {
    #[sea_orm(string_value = "DEPOSIT")]
    Deposit,
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    #[sea_orm(string_value = "WITHDRAWAL")]
    Withdrawal,
    #[sea_orm(string_value = "EXTERNAL_TRANSFER")]
    ExternalTransfer,
    #[sea_orm(string_value = "LOAN_DISBURSEMENT")]
    LoanDisbursement,
    #[sea_orm(string_value = "LOAN_PAYMENT")]
    LoanPayment,
    #[sea_orm(string_value = "CRYPTO_DEPOSIT")]
    CryptoDeposit,
    #[sea_orm(string_value = "TAX_REFUND")]
    TaxRefund,
    #[sea_orm(string_value = "GRANT")]
    Grant,
    #[sea_orm(string_value = "ADJUSTMENT")]
    Adjustment,
    #[sea_orm(string_value = "REVERSAL")]
    Reversal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum InitiatorRole {
    #[sea_orm(string_value = "CUSTOMER")]
    Customer,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "SYSTEM")]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum PostingDirection {
    #[sea_orm(string_value = "DEBIT")]
    Debit,
    #[sea_orm(string_value = "CREDIT")]
    Credit,
}

/// Generates `From` impls in both directions for enums with matching variants.
macro_rules! mirror_enum {
    ($db:ident <=> $core:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(AccountType <=> CoreAccountType {
    Checking, Savings, FixedDeposit, Current, Business, Investment, System
});
mirror_enum!(AccountStatus <=> CoreAccountStatus { Active, Frozen });
mirror_enum!(EntryStatus <=> CoreEntryStatus { Pending, Posted, Declined, Reversed });
mirror_enum!(EntryType <=> CoreEntryType {
    Deposit,
    Transfer,
    Withdrawal,
    ExternalTransfer,
    LoanDisbursement,
    LoanPayment,
    CryptoDeposit,
    TaxRefund,
    Grant,
    Adjustment,
    Reversal,
});
mirror_enum!(InitiatorRole <=> CoreInitiatorRole { Customer, Admin, System });
mirror_enum!(PostingDirection <=> CoreDirection { Debit, Credit });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_values_match_core_names() {
        for ty in CoreEntryType::ALL {
            assert_eq!(EntryType::from(ty).to_value(), ty.as_str());
        }
        for status in [
            CoreEntryStatus::Pending,
            CoreEntryStatus::Posted,
            CoreEntryStatus::Declined,
            CoreEntryStatus::Reversed,
        ] {
            assert_eq!(EntryStatus::from(status).to_value(), status.as_str());
        }
        for ty in CoreAccountType::ALL {
            assert_eq!(AccountType::from(ty).to_value(), ty.as_str());
            assert_eq!(CoreAccountType::from(AccountType::from(ty)), ty);
        }
    }
}
