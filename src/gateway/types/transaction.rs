//! Transaction snapshot as returned by the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::AccountId;
use crate::transaction::{Transaction, TransactionOutcome};

/// Transaction snapshot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionApiData {
    #[schema(example = "01HZX3J8B9Q6ZC1V4E9W2N7K5M")]
    pub transaction_id: String,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    /// Amount with 6 fractional digits
    #[schema(example = "12.500000")]
    pub amount: String,
    /// PENDING / PROCESSING / FULFILLED / REFUNDED / FAILED
    #[schema(example = "FULFILLED")]
    pub status: String,
    pub expired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the call returned before a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "DEADLINE_EXCEEDED")]
    pub in_flight_reason: Option<String>,
}

impl From<&Transaction> for TransactionApiData {
    fn from(txn: &Transaction) -> Self {
        Self {
            transaction_id: txn.transaction_id.to_string(),
            source_account_id: txn.source_account_id,
            destination_account_id: txn.destination_account_id,
            amount: txn.amount.format(),
            status: txn.status.as_str().to_string(),
            expired_at: txn.expired_at,
            created_at: txn.created_at,
            updated_at: txn.updated_at,
            in_flight_reason: None,
        }
    }
}

impl From<&TransactionOutcome> for TransactionApiData {
    fn from(outcome: &TransactionOutcome) -> Self {
        let mut data = Self::from(outcome.transaction());
        data.in_flight_reason = outcome.in_flight_reason().map(|r| r.as_str().to_string());
        data
    }
}
