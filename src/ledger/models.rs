//! Account ledger data models

use std::fmt;

use chrono::{DateTime, Utc};

use crate::core_types::{AccountId, NO_ACCOUNT, TransactionId};
use crate::money::Amount;

/// Account record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: AccountId,
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(account_id: AccountId, balance: Amount) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            balance,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fund movement stage
///
/// Stage IDs are stored as SMALLINT.
/// Terminal stages: CONFIRMED (2), CANCELED (3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum FundMovementStage {
    /// Source debited, amount on hold
    Tried = 1,
    /// Terminal: destination credited
    Confirmed = 2,
    /// Terminal: hold released back to source (or empty rollback)
    Canceled = 3,
}

impl FundMovementStage {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FundMovementStage::Confirmed | FundMovementStage::Canceled
        )
    }

    /// Only Tried → {Confirmed, Canceled} is legal
    pub fn can_transition_to(&self, next: FundMovementStage) -> bool {
        matches!(
            (self, next),
            (FundMovementStage::Tried, FundMovementStage::Confirmed)
                | (FundMovementStage::Tried, FundMovementStage::Canceled)
        )
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(FundMovementStage::Tried),
            2 => Some(FundMovementStage::Confirmed),
            3 => Some(FundMovementStage::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FundMovementStage::Tried => "TRIED",
            FundMovementStage::Confirmed => "CONFIRMED",
            FundMovementStage::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for FundMovementStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-transaction fund movement, the idempotency anchor of the TCC engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundMovement {
    pub transaction_id: TransactionId,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    /// Immutable after creation
    pub amount: Amount,
    pub stage: FundMovementStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FundMovement {
    /// Reservation written by Try
    pub fn tried(
        transaction_id: TransactionId,
        source_account_id: AccountId,
        destination_account_id: AccountId,
        amount: Amount,
    ) -> Self {
        let now = Utc::now();
        Self {
            transaction_id,
            source_account_id,
            destination_account_id,
            amount,
            stage: FundMovementStage::Tried,
            created_at: now,
            updated_at: now,
        }
    }

    /// Zero-amount Canceled record written when Cancel arrives before Try
    pub fn empty_rollback(transaction_id: TransactionId) -> Self {
        let now = Utc::now();
        Self {
            transaction_id,
            source_account_id: NO_ACCOUNT,
            destination_account_id: NO_ACCOUNT,
            amount: Amount::ZERO,
            stage: FundMovementStage::Canceled,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty_rollback(&self) -> bool {
        self.stage == FundMovementStage::Canceled && self.source_account_id == NO_ACCOUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_transitions() {
        use FundMovementStage::*;
        assert!(Tried.can_transition_to(Confirmed));
        assert!(Tried.can_transition_to(Canceled));
        assert!(!Confirmed.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Confirmed));
        assert!(!Canceled.can_transition_to(Tried));
        assert!(!Tried.can_transition_to(Tried));

        assert!(!Tried.is_terminal());
        assert!(Confirmed.is_terminal());
        assert!(Canceled.is_terminal());
    }

    #[test]
    fn test_stage_ids() {
        assert_eq!(FundMovementStage::from_id(1), Some(FundMovementStage::Tried));
        assert_eq!(FundMovementStage::Confirmed.id(), 2);
        assert_eq!(FundMovementStage::from_id(9), None);
        assert_eq!(FundMovementStage::Canceled.to_string(), "CANCELED");
    }

    #[test]
    fn test_empty_rollback_record() {
        let fm = FundMovement::empty_rollback(TransactionId::new());
        assert!(fm.is_empty_rollback());
        assert!(fm.amount.is_zero());
        assert_eq!(fm.stage, FundMovementStage::Canceled);

        let tried = FundMovement::tried(TransactionId::new(), 1, 2, Amount::ZERO);
        assert!(!tried.is_empty_rollback());
    }
}
