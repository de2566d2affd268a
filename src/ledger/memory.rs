//! In-process ledger store
//!
//! Emulates the row-locking behaviour of the PostgreSQL store: every row
//! (account or fund movement, present or not) has its own async mutex, a
//! `lock_*` read acquires it for the lifetime of the [`MemoryLedgerTx`], and
//! writes are staged until commit. Used by tests and the `memory` backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::error::LedgerError;
use super::models::{Account, FundMovement, FundMovementStage};
use super::store::{LedgerStore, LedgerTx};
use crate::core_types::{AccountId, TransactionId};
use crate::money::Amount;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RowKey {
    Account(AccountId),
    FundMovement(TransactionId),
}

impl RowKey {
    fn describe(&self) -> String {
        match self {
            RowKey::Account(id) => format!("account {}", id),
            RowKey::FundMovement(id) => format!("fund movement {}", id),
        }
    }
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    fund_movements: HashMap<TransactionId, FundMovement>,
}

#[derive(Default)]
struct Inner {
    tables: Mutex<Tables>,
    row_locks: DashMap<RowKey, Arc<Mutex<()>>>,
    #[cfg(test)]
    failing_commits: std::sync::atomic::AtomicUsize,
}

impl Inner {
    async fn lock_row(&self, key: RowKey) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(&*self.row_locks.entry(key).or_default());
        mutex.lock_owned().await
    }
}

/// Memory-backed [`LedgerStore`]
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<Inner>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` commits fail with a database error
    #[cfg(test)]
    pub fn fail_next_commits(&self, count: usize) {
        self.inner
            .failing_commits
            .store(count, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn create_account(
        &self,
        account_id: AccountId,
        balance: Amount,
    ) -> Result<Account, LedgerError> {
        if account_id <= 0 {
            return Err(LedgerError::InvalidAccountId(account_id));
        }
        let mut tables = self.inner.tables.lock().await;
        if tables.accounts.contains_key(&account_id) {
            return Err(LedgerError::DuplicateAccount(account_id));
        }
        let account = Account::new(account_id, balance);
        tables.accounts.insert(account_id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.inner.tables.lock().await.accounts.get(&account_id).cloned())
    }

    async fn get_fund_movement(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<FundMovement>, LedgerError> {
        Ok(self
            .inner
            .tables
            .lock()
            .await
            .fund_movements
            .get(transaction_id)
            .cloned())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        Ok(Box::new(MemoryLedgerTx {
            inner: Arc::clone(&self.inner),
            guards: HashMap::new(),
            balances: HashMap::new(),
            inserts: HashMap::new(),
            stages: HashMap::new(),
        }))
    }
}

/// Storage transaction over [`MemoryLedgerStore`]
///
/// Row guards are released when the transaction is committed or dropped.
pub struct MemoryLedgerTx {
    inner: Arc<Inner>,
    guards: HashMap<RowKey, OwnedMutexGuard<()>>,
    balances: HashMap<AccountId, Amount>,
    inserts: HashMap<TransactionId, FundMovement>,
    stages: HashMap<TransactionId, FundMovementStage>,
}

impl MemoryLedgerTx {
    async fn acquire(&mut self, key: RowKey) {
        if !self.guards.contains_key(&key) {
            let guard = self.inner.lock_row(key.clone()).await;
            self.guards.insert(key, guard);
        }
    }

    fn ensure_held(&self, key: &RowKey) -> Result<(), LedgerError> {
        if self.guards.contains_key(key) {
            Ok(())
        } else {
            Err(LedgerError::LockNotHeld(key.describe()))
        }
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn lock_fund_movement(
        &mut self,
        transaction_id: &TransactionId,
    ) -> Result<Option<FundMovement>, LedgerError> {
        self.acquire(RowKey::FundMovement(*transaction_id)).await;

        let mut movement = match self.inserts.get(transaction_id) {
            Some(fm) => Some(fm.clone()),
            None => self
                .inner
                .tables
                .lock()
                .await
                .fund_movements
                .get(transaction_id)
                .cloned(),
        };
        if let (Some(fm), Some(stage)) = (movement.as_mut(), self.stages.get(transaction_id)) {
            fm.stage = *stage;
        }
        Ok(movement)
    }

    async fn lock_account(&mut self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.acquire(RowKey::Account(account_id)).await;

        let mut account = self
            .inner
            .tables
            .lock()
            .await
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        if let Some(balance) = self.balances.get(&account_id) {
            account.balance = *balance;
        }
        Ok(account)
    }

    async fn insert_fund_movement(&mut self, movement: &FundMovement) -> Result<(), LedgerError> {
        let id = movement.transaction_id;
        self.acquire(RowKey::FundMovement(id)).await;

        let exists = self.inserts.contains_key(&id)
            || self
                .inner
                .tables
                .lock()
                .await
                .fund_movements
                .contains_key(&id);
        if exists {
            return Err(LedgerError::DuplicateFundMovement(id.to_string()));
        }
        self.inserts.insert(id, movement.clone());
        Ok(())
    }

    async fn update_stage(
        &mut self,
        transaction_id: &TransactionId,
        stage: FundMovementStage,
    ) -> Result<(), LedgerError> {
        self.ensure_held(&RowKey::FundMovement(*transaction_id))?;

        if let Some(fm) = self.inserts.get_mut(transaction_id) {
            fm.stage = stage;
            return Ok(());
        }
        let exists = self
            .inner
            .tables
            .lock()
            .await
            .fund_movements
            .contains_key(transaction_id);
        if !exists {
            return Err(LedgerError::FundMovementNotFound(transaction_id.to_string()));
        }
        self.stages.insert(*transaction_id, stage);
        Ok(())
    }

    async fn set_balance(
        &mut self,
        account_id: AccountId,
        balance: Amount,
    ) -> Result<(), LedgerError> {
        self.ensure_held(&RowKey::Account(account_id))?;
        self.balances.insert(account_id, balance);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let this = *self;

        #[cfg(test)]
        {
            use std::sync::atomic::Ordering;
            let failing = &this.inner.failing_commits;
            if failing
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(LedgerError::Database("injected commit failure".into()));
            }
        }

        let now = Utc::now();
        let mut tables = this.inner.tables.lock().await;

        for (id, movement) in this.inserts {
            if tables.fund_movements.contains_key(&id) {
                return Err(LedgerError::DuplicateFundMovement(id.to_string()));
            }
            tables.fund_movements.insert(id, movement);
        }
        for (id, stage) in this.stages {
            if let Some(fm) = tables.fund_movements.get_mut(&id) {
                fm.stage = stage;
                fm.updated_at = now;
            }
        }
        for (account_id, balance) in this.balances {
            if let Some(account) = tables.accounts.get_mut(&account_id) {
                account.balance = balance;
                account.updated_at = now;
            }
        }
        debug!(rows = this.guards.len(), "memory ledger commit");
        // row guards drop here, after the writes are visible
        drop(tables);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn units(n: i64) -> Amount {
        Amount::from_units(n).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_account() {
        let store = MemoryLedgerStore::new();
        store.create_account(1, units(100)).await.unwrap();

        let acc = store.get_account(1).await.unwrap().unwrap();
        assert_eq!(acc.balance, units(100));
        assert!(store.get_account(2).await.unwrap().is_none());

        assert_eq!(
            store.create_account(1, units(5)).await,
            Err(LedgerError::DuplicateAccount(1))
        );
        assert_eq!(
            store.create_account(0, units(5)).await,
            Err(LedgerError::InvalidAccountId(0))
        );
    }

    #[tokio::test]
    async fn test_commit_applies_writes() {
        let store = MemoryLedgerStore::new();
        store.create_account(1, units(100)).await.unwrap();
        let id = TransactionId::new();

        let mut tx = store.begin().await.unwrap();
        let acc = tx.lock_account(1).await.unwrap();
        tx.set_balance(1, acc.balance.checked_sub(units(30)).unwrap())
            .await
            .unwrap();
        tx.insert_fund_movement(&FundMovement::tried(id, 1, 2, units(30)))
            .await
            .unwrap();
        // reads inside the transaction see staged writes
        assert_eq!(tx.lock_account(1).await.unwrap().balance, units(70));
        assert!(tx.lock_fund_movement(&id).await.unwrap().is_some());
        tx.commit().await.unwrap();

        assert_eq!(store.get_account(1).await.unwrap().unwrap().balance, units(70));
        let fm = store.get_fund_movement(&id).await.unwrap().unwrap();
        assert_eq!(fm.stage, FundMovementStage::Tried);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = MemoryLedgerStore::new();
        store.create_account(1, units(100)).await.unwrap();
        let id = TransactionId::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.lock_account(1).await.unwrap();
            tx.set_balance(1, units(1)).await.unwrap();
            tx.insert_fund_movement(&FundMovement::tried(id, 1, 2, units(99)))
                .await
                .unwrap();
        }

        assert_eq!(store.get_account(1).await.unwrap().unwrap().balance, units(100));
        assert!(store.get_fund_movement(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_requires_lock() {
        let store = MemoryLedgerStore::new();
        store.create_account(1, units(100)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.set_balance(1, units(1)).await,
            Err(LedgerError::LockNotHeld(_))
        ));
        assert!(matches!(
            tx.update_stage(&TransactionId::new(), FundMovementStage::Confirmed)
                .await,
            Err(LedgerError::LockNotHeld(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_account() {
        let store = MemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        assert_eq!(
            tx.lock_account(42).await,
            Err(LedgerError::AccountNotFound(42))
        );
    }

    #[tokio::test]
    async fn test_duplicate_insert() {
        let store = MemoryLedgerStore::new();
        let id = TransactionId::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_fund_movement(&FundMovement::empty_rollback(id))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.insert_fund_movement(&FundMovement::empty_rollback(id))
                .await,
            Err(LedgerError::DuplicateFundMovement(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_row_lock_blocks_second_transaction() {
        let store = MemoryLedgerStore::new();
        store.create_account(1, units(100)).await.unwrap();

        let mut holder = store.begin().await.unwrap();
        holder.lock_account(1).await.unwrap();

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut tx = store.begin().await.unwrap();
                tx.lock_account(1).await.unwrap().balance
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished(), "second locker must wait");

        holder.set_balance(1, units(60)).await.unwrap();
        holder.commit().await.unwrap();

        // the waiter sees the committed value once the lock is released
        assert_eq!(contender.await.unwrap(), units(60));
    }

    #[tokio::test]
    async fn test_injected_commit_failure() {
        let store = MemoryLedgerStore::new();
        store.create_account(1, units(100)).await.unwrap();
        store.fail_next_commits(1);

        let mut tx = store.begin().await.unwrap();
        tx.lock_account(1).await.unwrap();
        tx.set_balance(1, units(0)).await.unwrap();
        assert!(matches!(tx.commit().await, Err(LedgerError::Database(_))));
        assert_eq!(store.get_account(1).await.unwrap().unwrap().balance, units(100));

        // only one failure was injected
        let mut tx = store.begin().await.unwrap();
        tx.lock_account(1).await.unwrap();
        tx.set_balance(1, units(0)).await.unwrap();
        tx.commit().await.unwrap();
    }
}
