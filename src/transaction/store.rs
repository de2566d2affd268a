//! Transaction Store
//!
//! Durable transaction records. Every status write is a compare-and-set
//! against the set of legal predecessor statuses, so the orchestrator, a
//! manual retry and the sweeper can race without regressing a status.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::error::TransactionError;
use super::state::TransactionStatus;
use super::types::Transaction;
use crate::core_types::TransactionId;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist a new record. Fails with `DuplicateTransaction` if the id exists.
    async fn create(&self, txn: &Transaction) -> Result<(), TransactionError>;

    async fn get(&self, transaction_id: &TransactionId)
    -> Result<Option<Transaction>, TransactionError>;

    /// Atomic CAS: set `new_status` only if the current status is in `expected`
    ///
    /// Returns `true` if the row was updated.
    async fn update_status_if(
        &self,
        transaction_id: &TransactionId,
        expected: &[TransactionStatus],
        new_status: TransactionStatus,
    ) -> Result<bool, TransactionError>;

    /// Non-terminal transactions with `expired_at < now`, oldest first
    async fn find_expired(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionError>;
}

/// Move forward to `new_status` from any legal predecessor
#[cfg(test)]
pub(crate) async fn advance<S: TransactionStore + ?Sized>(
    store: &S,
    transaction_id: &TransactionId,
    new_status: TransactionStatus,
) -> Result<bool, TransactionError> {
    store
        .update_status_if(transaction_id, new_status.predecessors(), new_status)
        .await
}

/// In-process transaction store
#[derive(Default)]
pub struct MemoryTransactionStore {
    records: RwLock<HashMap<TransactionId, Transaction>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `expired_at`, for driving expiry in tests
    #[cfg(test)]
    pub async fn set_expired_at(&self, transaction_id: &TransactionId, at: DateTime<Utc>) {
        if let Some(txn) = self.records.write().await.get_mut(transaction_id) {
            txn.expired_at = at;
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn create(&self, txn: &Transaction) -> Result<(), TransactionError> {
        let mut records = self.records.write().await;
        if records.contains_key(&txn.transaction_id) {
            return Err(TransactionError::DuplicateTransaction(
                txn.transaction_id.to_string(),
            ));
        }
        let mut stored = txn.clone();
        stored.retries = 0;
        records.insert(txn.transaction_id, stored);
        Ok(())
    }

    async fn get(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Transaction>, TransactionError> {
        Ok(self.records.read().await.get(transaction_id).cloned())
    }

    async fn update_status_if(
        &self,
        transaction_id: &TransactionId,
        expected: &[TransactionStatus],
        new_status: TransactionStatus,
    ) -> Result<bool, TransactionError> {
        let mut records = self.records.write().await;
        match records.get_mut(transaction_id) {
            Some(txn) if expected.contains(&txn.status) => {
                txn.status = new_status;
                txn.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_expired(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionError> {
        let records = self.records.read().await;
        let mut expired: Vec<Transaction> = records
            .values()
            .filter(|t| !t.status.is_terminal() && t.is_expired(now))
            .cloned()
            .collect();
        expired.sort_by_key(|t| (t.expired_at, t.transaction_id));
        expired.truncate(limit);
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Amount;

    fn pending() -> Transaction {
        Transaction::new(1, 2, Amount::ZERO, chrono::Duration::minutes(10))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryTransactionStore::new();
        let txn = pending();
        store.create(&txn).await.unwrap();

        assert_eq!(store.get(&txn.transaction_id).await.unwrap(), Some(txn.clone()));
        assert!(matches!(
            store.create(&txn).await,
            Err(TransactionError::DuplicateTransaction(_))
        ));
        assert_eq!(store.get(&TransactionId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cas_never_regresses() {
        let store = MemoryTransactionStore::new();
        let txn = pending();
        let id = txn.transaction_id;
        store.create(&txn).await.unwrap();

        assert!(advance(&store, &id, TransactionStatus::Processing).await.unwrap());
        assert!(advance(&store, &id, TransactionStatus::Fulfilled).await.unwrap());

        // Terminal: every later write loses
        assert!(!advance(&store, &id, TransactionStatus::Failed).await.unwrap());
        assert!(!advance(&store, &id, TransactionStatus::Processing).await.unwrap());
        assert_eq!(
            store.get(&id).await.unwrap().unwrap().status,
            TransactionStatus::Fulfilled
        );
    }

    #[tokio::test]
    async fn test_cas_expected_mismatch() {
        let store = MemoryTransactionStore::new();
        let txn = pending();
        let id = txn.transaction_id;
        store.create(&txn).await.unwrap();

        let updated = store
            .update_status_if(
                &id,
                &[TransactionStatus::Processing],
                TransactionStatus::Fulfilled,
            )
            .await
            .unwrap();
        assert!(!updated);
        assert!(
            !advance(&store, &TransactionId::new(), TransactionStatus::Failed)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_find_expired_skips_terminal_and_fresh() {
        let store = MemoryTransactionStore::new();
        let now = Utc::now();

        let mut ids = Vec::new();
        for i in 0..4 {
            let txn = pending();
            store.create(&txn).await.unwrap();
            store
                .set_expired_at(&txn.transaction_id, now - chrono::Duration::seconds(10 - i))
                .await;
            ids.push(txn.transaction_id);
        }
        advance(&store, &ids[1], TransactionStatus::Failed).await.unwrap();
        advance(&store, &ids[2], TransactionStatus::Processing).await.unwrap();

        let fresh = pending();
        store.create(&fresh).await.unwrap();

        let expired = store.find_expired(now, 10).await.unwrap();
        let found: Vec<_> = expired.iter().map(|t| t.transaction_id).collect();
        assert_eq!(found, vec![ids[0], ids[2], ids[3]]);

        assert_eq!(store.find_expired(now, 2).await.unwrap().len(), 2);
    }
}
