//! Ledger entry and posting domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use snel_shared::types::{AccountId, CurrencyCode, EntryId, PostingId, UserId};
use std::fmt;
use uuid::Uuid;

use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Side of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Money leaves the account.
    Debit,
    /// Money arrives in the account.
    Credit,
}

impl Direction {
    /// Returns the string representation of the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }

    /// Parses a direction from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBIT" => Some(Self::Debit),
            "CREDIT" => Some(Self::Credit),
            _ => None,
        }
    }

    /// Returns the other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Returns the effect of `amount` on an account balance (credit positive).
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Debit => -amount,
            Self::Credit => amount,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of money movement an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Customer deposit funded by the funding system account.
    Deposit,
    /// Transfer between two ledger accounts.
    Transfer,
    /// Customer withdrawal paid out through the payout system account.
    Withdrawal,
    /// Transfer to an account at another bank.
    ExternalTransfer,
    /// Loan principal paid to the customer.
    LoanDisbursement,
    /// Loan repayment from the customer.
    LoanPayment,
    /// Settlement of a verified crypto deposit.
    CryptoDeposit,
    /// Tax refund payout.
    TaxRefund,
    /// Grant payout.
    Grant,
    /// Manual admin correction.
    Adjustment,
    /// Corrective entry negating a posted entry.
    Reversal,
}

impl EntryType {
    /// All entry types.
    pub const ALL: [Self; 11] = [
        Self::Deposit,
        Self::Transfer,
        Self::Withdrawal,
        Self::ExternalTransfer,
        Self::LoanDisbursement,
        Self::LoanPayment,
        Self::CryptoDeposit,
        Self::TaxRefund,
        Self::Grant,
        Self::Adjustment,
        Self::Reversal,
    ];

    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Transfer => "TRANSFER",
            Self::Withdrawal => "WITHDRAWAL",
            Self::ExternalTransfer => "EXTERNAL_TRANSFER",
            Self::LoanDisbursement => "LOAN_DISBURSEMENT",
            Self::LoanPayment => "LOAN_PAYMENT",
            Self::CryptoDeposit => "CRYPTO_DEPOSIT",
            Self::TaxRefund => "TAX_REFUND",
            Self::Grant => "GRANT",
            Self::Adjustment => "ADJUSTMENT",
            Self::Reversal => "REVERSAL",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == upper)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain context attached to an entry.
///
/// The variant decides the entry type, so the two can never disagree.
/// References to loans, applications and crypto deposits are display-only
/// back-references into the owning domain service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryDetails {
    /// Plain deposit.
    Deposit,
    /// Transfer between ledger accounts.
    Transfer,
    /// Plain withdrawal.
    Withdrawal,
    /// Transfer to another bank.
    ExternalTransfer {
        /// Recipient bank name.
        bank_name: String,
        /// Recipient account number at that bank.
        account_number: String,
        /// Routing or sort code, if the rail uses one.
        routing_number: Option<String>,
        /// Recipient display name.
        recipient_name: String,
    },
    /// Loan disbursement.
    LoanDisbursement {
        /// Loan being disbursed.
        loan_id: Uuid,
    },
    /// Loan repayment.
    LoanPayment {
        /// Loan being repaid.
        loan_id: Uuid,
    },
    /// Crypto deposit settlement.
    CryptoDeposit {
        /// Crypto deposit request being settled.
        deposit_id: Uuid,
        /// Asset ticker, e.g. `USDT`.
        crypto_type: String,
        /// On-chain transaction hash, when known.
        tx_hash: Option<String>,
    },
    /// Tax refund payout.
    TaxRefund {
        /// Refund application.
        application_id: Uuid,
    },
    /// Grant payout.
    Grant {
        /// Grant application.
        application_id: Uuid,
    },
    /// Manual admin correction.
    Adjustment {
        /// Why the adjustment was made.
        reason: String,
    },
    /// Corrective entry for a posted entry.
    Reversal {
        /// Entry being negated.
        original_entry_id: EntryId,
        /// Why it was reversed.
        reason: String,
    },
}

impl EntryDetails {
    /// Returns the entry type this variant records.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        match self {
            Self::Deposit => EntryType::Deposit,
            Self::Transfer => EntryType::Transfer,
            Self::Withdrawal => EntryType::Withdrawal,
            Self::ExternalTransfer { .. } => EntryType::ExternalTransfer,
            Self::LoanDisbursement { .. } => EntryType::LoanDisbursement,
            Self::LoanPayment { .. } => EntryType::LoanPayment,
            Self::CryptoDeposit { .. } => EntryType::CryptoDeposit,
            Self::TaxRefund { .. } => EntryType::TaxRefund,
            Self::Grant { .. } => EntryType::Grant,
            Self::Adjustment { .. } => EntryType::Adjustment,
            Self::Reversal { .. } => EntryType::Reversal,
        }
    }
}

/// Authority under which an entry was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitiatorRole {
    /// The account owner acting for themselves.
    Customer,
    /// A bank administrator.
    Admin,
    /// An automated bank process.
    System,
}

impl InitiatorRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
            Self::System => "SYSTEM",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUSTOMER" => Some(Self::Customer),
            "ADMIN" => Some(Self::Admin),
            "SYSTEM" => Some(Self::System),
            _ => None,
        }
    }

    /// Returns true for roles that act on behalf of the bank.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::System)
    }
}

impl fmt::Display for InitiatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creator reference of an entry together with its authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Initiator {
    /// User creating the entry.
    pub user_id: UserId,
    /// Authority the user acts with.
    pub role: InitiatorRole,
}

impl Initiator {
    /// A customer acting on their own accounts.
    #[must_use]
    pub const fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: InitiatorRole::Customer,
        }
    }

    /// A bank administrator.
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: InitiatorRole::Admin,
        }
    }

    /// An automated bank process.
    #[must_use]
    pub const fn system(user_id: UserId) -> Self {
        Self {
            user_id,
            role: InitiatorRole::System,
        }
    }
}

/// One proposed leg of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingInput {
    /// Account the leg applies to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub direction: Direction,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Free text shown on statements.
    pub description: String,
}

impl PostingInput {
    /// A debit leg.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            direction: Direction::Debit,
            amount,
            description: String::new(),
        }
    }

    /// A credit leg.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            direction: Direction::Credit,
            amount,
            description: String::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A proposed entry, as handed to `Ledger::create_entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    /// Domain context, which also fixes the entry type.
    pub details: EntryDetails,
    /// Who creates the entry.
    pub initiator: Initiator,
    /// Currency every leg is denominated in.
    pub currency: CurrencyCode,
    /// Free text memo.
    pub memo: String,
    /// Proposed legs.
    pub postings: Vec<PostingInput>,
}

impl NewEntry {
    /// Starts an entry with no postings.
    #[must_use]
    pub fn new(details: EntryDetails, initiator: Initiator, currency: CurrencyCode) -> Self {
        Self {
            details,
            initiator,
            currency,
            memo: String::new(),
            postings: Vec::new(),
        }
    }

    /// Sets the memo.
    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Adds a posting.
    #[must_use]
    pub fn posting(mut self, posting: PostingInput) -> Self {
        self.postings.push(posting);
        self
    }

    /// Adds a debit leg.
    #[must_use]
    pub fn debit(self, account_id: AccountId, amount: Decimal) -> Self {
        self.posting(PostingInput::debit(account_id, amount))
    }

    /// Adds a credit leg.
    #[must_use]
    pub fn credit(self, account_id: AccountId, amount: Decimal) -> Self {
        self.posting(PostingInput::credit(account_id, amount))
    }

    /// Returns the entry type.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        self.details.entry_type()
    }
}

/// A committed leg of an entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPosting {
    /// Unique identifier.
    pub id: PostingId,
    /// Parent entry.
    pub entry_id: EntryId,
    /// Account the leg applies to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub direction: Direction,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Free text shown on statements.
    pub description: String,
}

impl LedgerPosting {
    /// Returns the effect of this posting on its account balance.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.direction.signed(self.amount)
    }
}

/// A committed entry with its postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier.
    pub id: EntryId,
    /// Unique reference shown to customers.
    pub reference: String,
    /// Domain context.
    pub details: EntryDetails,
    /// Currency of every leg.
    pub currency: CurrencyCode,
    /// Creator reference.
    pub created_by: UserId,
    /// Authority of the creator.
    pub initiated_as: InitiatorRole,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Current state.
    pub status: EntryStatus,
    /// Who approved or declined the entry.
    pub approved_by: Option<UserId>,
    /// When the entry was approved or declined.
    pub approved_at: Option<DateTime<Utc>>,
    /// Free text memo.
    pub memo: String,
    /// Balanced legs, at least two.
    pub postings: Vec<LedgerPosting>,
}

impl LedgerEntry {
    /// Returns the entry type.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        self.details.entry_type()
    }

    /// Returns the creator together with its authority.
    #[must_use]
    pub fn initiator(&self) -> Initiator {
        Initiator {
            user_id: self.created_by,
            role: self.initiated_as,
        }
    }

    /// Total moved by the entry (the debit side).
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.postings
            .iter()
            .filter(|p| p.direction == Direction::Debit)
            .map(|p| p.amount)
            .sum()
    }

    /// Returns true if any posting touches `account_id`.
    #[must_use]
    pub fn touches(&self, account_id: AccountId) -> bool {
        self.postings.iter().any(|p| p.account_id == account_id)
    }

    /// Applies a validated workflow action to this entry.
    ///
    /// Approve and decline record the actor as approver. Reverse only moves
    /// the status; the corrective entry carries the reversal's audit trail.
    pub fn apply(&mut self, action: &WorkflowAction) {
        self.status = action.new_status();
        match action {
            WorkflowAction::Approve { .. } | WorkflowAction::Decline { .. } => {
                self.approved_by = Some(action.actor());
                self.approved_at = Some(action.acted_at());
            }
            WorkflowAction::Reverse { .. } => {}
        }
    }
}
