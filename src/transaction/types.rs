//! Transaction data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::state::TransactionStatus;
use crate::core_types::{AccountId, TransactionId};
use crate::money::Amount;

/// Transaction record (owned by the transaction store)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: Amount,
    pub status: TransactionStatus,
    /// After this instant the sweeper force-cancels a non-terminal transaction
    pub expired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Confirm/Cancel attempts made by this process (not persisted)
    #[serde(skip)]
    pub retries: u32,
}

impl Transaction {
    /// New PENDING transaction expiring `ttl` from now
    pub fn new(
        source_account_id: AccountId,
        destination_account_id: AccountId,
        amount: Amount,
        ttl: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            transaction_id: TransactionId::new(),
            source_account_id,
            destination_account_id,
            amount,
            status: TransactionStatus::Pending,
            expired_at: now + ttl,
            created_at: now,
            updated_at: now,
            retries: 0,
        }
    }

    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expired_at < now
    }
}

/// Why a transaction was handed back before reaching a terminal status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlightReason {
    /// The caller's overall deadline passed; background work continues
    DeadlineExceeded,
    /// Confirm/Cancel retries ran out; left for the sweeper or a manual retry
    RetriesExhausted,
}

impl InFlightReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InFlightReason::DeadlineExceeded => "DEADLINE_EXCEEDED",
            InFlightReason::RetriesExhausted => "RETRIES_EXHAUSTED",
        }
    }
}

/// Result of driving a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Settled(Transaction),
    InFlight {
        transaction: Transaction,
        reason: InFlightReason,
    },
}

impl TransactionOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            TransactionOutcome::Settled(t) => t,
            TransactionOutcome::InFlight { transaction, .. } => transaction,
        }
    }

    pub fn into_transaction(self) -> Transaction {
        match self {
            TransactionOutcome::Settled(t) => t,
            TransactionOutcome::InFlight { transaction, .. } => transaction,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, TransactionOutcome::Settled(_))
    }

    pub fn in_flight_reason(&self) -> Option<InFlightReason> {
        match self {
            TransactionOutcome::Settled(_) => None,
            TransactionOutcome::InFlight { reason, .. } => Some(*reason),
        }
    }
}

/// Create transaction request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    /// Decimal string, at most 6 fractional digits
    #[schema(example = "12.5")]
    pub amount: String,
}

/// Retry transaction request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RetryTransactionRequest {
    /// ULID of the transaction
    pub transaction_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction_is_pending() {
        let amount = Amount::from_units(5).unwrap();
        let txn = Transaction::new(1, 2, amount, chrono::Duration::minutes(10));
        assert_eq!(txn.status, TransactionStatus::Pending);
        assert_eq!(txn.retries, 0);
        assert!(txn.expired_at > txn.created_at);
        assert!(!txn.is_expired(Utc::now()));
        assert!(txn.is_expired(Utc::now() + chrono::Duration::minutes(11)));
    }

    #[test]
    fn test_retries_not_serialized() {
        let txn = Transaction::new(1, 2, Amount::ZERO, chrono::Duration::minutes(1));
        let json = serde_json::to_value(&txn).unwrap();
        assert!(json.get("retries").is_none());
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["amount"], "0.000000");
    }

    #[test]
    fn test_outcome_accessors() {
        let txn = Transaction::new(1, 2, Amount::ZERO, chrono::Duration::minutes(1));
        let settled = TransactionOutcome::Settled(txn.clone());
        assert!(settled.is_settled());
        assert_eq!(settled.in_flight_reason(), None);

        let in_flight = TransactionOutcome::InFlight {
            transaction: txn.clone(),
            reason: InFlightReason::DeadlineExceeded,
        };
        assert!(!in_flight.is_settled());
        assert_eq!(in_flight.transaction(), &txn);
        assert_eq!(
            in_flight.in_flight_reason(),
            Some(InFlightReason::DeadlineExceeded)
        );
    }
}
