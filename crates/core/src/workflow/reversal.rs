//! Reversal service for negating posted entries.
//!
//! A reversal never edits the original entry. It builds a new entry whose
//! postings mirror the original with debit and credit swapped.

use rust_decimal::Decimal;

use crate::ledger::entry::{
    Direction, EntryDetails, Initiator, LedgerEntry, LedgerPosting, NewEntry, PostingInput,
};
use crate::workflow::error::WorkflowError;

/// Stateless service for creating reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Build the corrective entry for `original`.
    ///
    /// For each original posting:
    /// - Debits become credits
    /// - Credits become debits
    /// - Account and amount are preserved
    /// - Description is prefixed with "Reversal: "
    ///
    /// # Errors
    ///
    /// Returns `ReversalReasonRequired` for a blank reason and
    /// `NothingToReverse` if the original has no postings.
    pub fn reversing_entry(
        original: &LedgerEntry,
        initiator: Initiator,
        reason: &str,
    ) -> Result<NewEntry, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::ReversalReasonRequired);
        }
        if original.postings.is_empty() {
            return Err(WorkflowError::NothingToReverse);
        }

        let postings = original
            .postings
            .iter()
            .map(|posting| PostingInput {
                account_id: posting.account_id,
                direction: posting.direction.opposite(),
                amount: posting.amount,
                description: format!("Reversal: {}", posting.description),
            })
            .collect();

        Ok(NewEntry {
            details: EntryDetails::Reversal {
                original_entry_id: original.id,
                reason: reason.trim().to_string(),
            },
            initiator,
            currency: original.currency.clone(),
            memo: format!(
                "Reversal of entry {}. Reason: {}",
                original.reference,
                reason.trim()
            ),
            postings,
        })
    }

    /// Returns true if the postings' debits equal their credits.
    ///
    /// This should always hold for committed entries.
    #[must_use]
    pub fn is_balanced(postings: &[LedgerPosting]) -> bool {
        let (debits, credits) = postings.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(debits, credits), p| match p.direction {
                Direction::Debit => (debits + p.amount, credits),
                Direction::Credit => (debits, credits + p.amount),
            },
        );
        debits == credits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::EntryStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use snel_shared::types::{AccountId, CurrencyCode, EntryId, PostingId, UserId};

    fn posted_transfer(from: AccountId, to: AccountId) -> LedgerEntry {
        let id = EntryId::new();
        let posting = |account_id, direction, description: &str| LedgerPosting {
            id: PostingId::new(),
            entry_id: id,
            account_id,
            direction,
            amount: dec!(40.00),
            description: description.to_string(),
        };
        LedgerEntry {
            id,
            reference: "A1B2C3D4E5F6".to_string(),
            details: EntryDetails::Transfer,
            currency: CurrencyCode::parse("GHS").unwrap(),
            created_by: UserId::new(),
            initiated_as: crate::ledger::entry::InitiatorRole::Customer,
            created_at: Utc::now(),
            status: EntryStatus::Posted,
            approved_by: None,
            approved_at: None,
            memo: "rent".to_string(),
            postings: vec![
                posting(from, Direction::Debit, "to landlord"),
                posting(to, Direction::Credit, "from tenant"),
            ],
        }
    }

    #[test]
    fn test_reversing_entry_swaps_directions() {
        let from = AccountId::new();
        let to = AccountId::new();
        let original = posted_transfer(from, to);
        let admin = Initiator::admin(UserId::new());

        let reversal = ReversalService::reversing_entry(&original, admin, "duplicate").unwrap();

        assert_eq!(reversal.postings.len(), 2);
        assert_eq!(reversal.postings[0].account_id, from);
        assert_eq!(reversal.postings[0].direction, Direction::Credit);
        assert_eq!(reversal.postings[1].account_id, to);
        assert_eq!(reversal.postings[1].direction, Direction::Debit);
        assert_eq!(reversal.postings[0].description, "Reversal: to landlord");
        assert_eq!(reversal.initiator, admin);
        assert_eq!(
            reversal.memo,
            "Reversal of entry A1B2C3D4E5F6. Reason: duplicate"
        );
        assert_eq!(
            reversal.details,
            EntryDetails::Reversal {
                original_entry_id: original.id,
                reason: "duplicate".to_string(),
            }
        );
    }

    #[test]
    fn test_reversing_entry_requires_reason() {
        let original = posted_transfer(AccountId::new(), AccountId::new());
        let result = ReversalService::reversing_entry(&original, Initiator::admin(UserId::new()), " ");
        assert_eq!(result, Err(WorkflowError::ReversalReasonRequired));
    }

    #[test]
    fn test_is_balanced() {
        let original = posted_transfer(AccountId::new(), AccountId::new());
        assert!(ReversalService::is_balanced(&original.postings));
        assert!(!ReversalService::is_balanced(&original.postings[..1]));
    }
}
