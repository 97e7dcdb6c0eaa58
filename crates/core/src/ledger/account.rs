//! Account domain types and account number allocation.
//!
//! Accounts never store a balance. Everything monetary about an account is
//! derived from the postings of its posted entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snel_shared::types::{AccountId, CurrencyCode, CustomerId};
use std::fmt;

/// Kind of account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Everyday checking account.
    Checking,
    /// Savings account.
    Savings,
    /// Fixed deposit account.
    FixedDeposit,
    /// Current account.
    Current,
    /// Business account.
    Business,
    /// Investment account.
    Investment,
    /// Internal counter-party account owned by the bank.
    System,
}

impl AccountType {
    /// All account types.
    pub const ALL: [Self; 7] = [
        Self::Checking,
        Self::Savings,
        Self::FixedDeposit,
        Self::Current,
        Self::Business,
        Self::Investment,
        Self::System,
    ];

    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "CHECKING",
            Self::Savings => "SAVINGS",
            Self::FixedDeposit => "FIXED_DEPOSIT",
            Self::Current => "CURRENT",
            Self::Business => "BUSINESS",
            Self::Investment => "INVESTMENT",
            Self::System => "SYSTEM",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == upper)
    }

    /// Two letter code used in account numbers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        &self.as_str()[..2]
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an account. Accounts are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Account accepts postings.
    Active,
    /// Account is frozen by an admin.
    Frozen,
}

impl AccountStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Frozen => "FROZEN",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(Self::Active),
            "FROZEN" => Some(Self::Frozen),
            _ => None,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who owns an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "customer_id", rename_all = "lowercase")]
pub enum AccountOwner {
    /// A customer of the bank.
    Customer(CustomerId),
    /// The bank itself.
    System,
}

impl AccountOwner {
    /// Returns the customer id, if the owner is a customer.
    #[must_use]
    pub fn customer(&self) -> Option<CustomerId> {
        match self {
            Self::Customer(id) => Some(*id),
            Self::System => None,
        }
    }
}

/// A ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owner of the account.
    pub owner: AccountOwner,
    /// Kind of account.
    pub account_type: AccountType,
    /// Currency every posting against this account must use.
    pub currency: CurrencyCode,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Unique human facing account number.
    pub account_number: String,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Opens a new active account.
    #[must_use]
    pub fn open(
        owner: AccountOwner,
        account_type: AccountType,
        currency: CurrencyCode,
        account_number: String,
    ) -> Self {
        Self {
            id: AccountId::new(),
            owner,
            account_type,
            currency,
            status: AccountStatus::Active,
            account_number,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the account is frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.status == AccountStatus::Frozen
    }

    /// Returns true if the account belongs to the bank.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.owner == AccountOwner::System
    }

    /// Returns true if `other` describes the same owner, type and currency.
    #[must_use]
    pub fn same_holding(&self, other: &Self) -> bool {
        self.owner == other.owner
            && self.account_type == other.account_type
            && self.currency == other.currency
    }
}

/// Deterministic account number for a customer holding.
///
/// Format: `ACCT-{customer id as 32 upper hex digits}-{type code}`.
#[must_use]
pub fn customer_account_number(customer: CustomerId, account_type: AccountType) -> String {
    format!(
        "ACCT-{:X}-{}",
        customer.into_inner().simple(),
        account_type.code()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    #[case(AccountType::Checking, "CH")]
    #[case(AccountType::Savings, "SA")]
    #[case(AccountType::FixedDeposit, "FI")]
    #[case(AccountType::Current, "CU")]
    #[case(AccountType::Business, "BU")]
    #[case(AccountType::Investment, "IN")]
    #[case(AccountType::System, "SY")]
    fn test_account_type_code(#[case] account_type: AccountType, #[case] code: &str) {
        assert_eq!(account_type.code(), code);
        assert_eq!(AccountType::parse(account_type.as_str()), Some(account_type));
    }

    #[test]
    fn test_account_type_parse_is_case_insensitive() {
        assert_eq!(AccountType::parse("savings"), Some(AccountType::Savings));
        assert_eq!(
            AccountType::parse("fixed_deposit"),
            Some(AccountType::FixedDeposit)
        );
        assert_eq!(AccountType::parse("loan"), None);
    }

    #[test]
    fn test_account_status_parse() {
        assert_eq!(AccountStatus::parse("frozen"), Some(AccountStatus::Frozen));
        assert_eq!(AccountStatus::parse("ACTIVE"), Some(AccountStatus::Active));
        assert_eq!(AccountStatus::parse("closed"), None);
    }

    #[test]
    fn test_customer_account_number_is_deterministic() {
        let customer = CustomerId::from_uuid(Uuid::from_u128(0x0192_f3a4_0000_7000_8000_0000_0000_002a));
        let number = customer_account_number(customer, AccountType::Checking);
        assert_eq!(number, "ACCT-0192F3A400007000800000000000002A-CH");
        assert_eq!(number, customer_account_number(customer, AccountType::Checking));
        assert_ne!(number, customer_account_number(customer, AccountType::Savings));
    }

    #[test]
    fn test_open_account_is_active() {
        let account = Account::open(
            AccountOwner::System,
            AccountType::System,
            CurrencyCode::parse("GHS").unwrap(),
            "SYS-0001".to_string(),
        );
        assert!(!account.is_frozen());
        assert!(account.is_system());
        assert_eq!(account.owner.customer(), None);
    }
}
