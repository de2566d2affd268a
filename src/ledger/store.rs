//! Account ledger store traits
//!
//! The TCC engine talks to the ledger only through these traits. A
//! [`LedgerTx`] is one storage transaction: rows are locked by the
//! `lock_*` reads and stay locked until the transaction commits or is
//! dropped. Dropping without [`LedgerTx::commit`] rolls back every write.

use async_trait::async_trait;

use super::error::LedgerError;
use super::models::{Account, FundMovement, FundMovementStage};
use crate::core_types::{AccountId, TransactionId};
use crate::money::Amount;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a new account. Fails with `DuplicateAccount` if the id exists.
    async fn create_account(
        &self,
        account_id: AccountId,
        balance: Amount,
    ) -> Result<Account, LedgerError>;

    /// Non-locking read
    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, LedgerError>;

    /// Non-locking read, for audit and operators
    async fn get_fund_movement(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<FundMovement>, LedgerError>;

    /// Open a storage transaction
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError>;
}

/// One storage transaction holding row locks
#[async_trait]
pub trait LedgerTx: Send {
    /// Locking read (`SELECT ... FOR UPDATE`) of the fund movement row
    async fn lock_fund_movement(
        &mut self,
        transaction_id: &TransactionId,
    ) -> Result<Option<FundMovement>, LedgerError>;

    /// Locking read of an account row. Fails with `AccountNotFound`.
    async fn lock_account(&mut self, account_id: AccountId) -> Result<Account, LedgerError>;

    /// Fails with `DuplicateFundMovement` when the unique key is taken
    async fn insert_fund_movement(&mut self, movement: &FundMovement) -> Result<(), LedgerError>;

    async fn update_stage(
        &mut self,
        transaction_id: &TransactionId,
        stage: FundMovementStage,
    ) -> Result<(), LedgerError>;

    /// The account row must have been locked in this transaction
    async fn set_balance(&mut self, account_id: AccountId, balance: Amount)
    -> Result<(), LedgerError>;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;
}

/// Lock two accounts in ascending id order and return them as (first, second)
/// in the order they were asked for.
///
/// A fixed lock order keeps A→B and B→A transfers from deadlocking on each
/// other's rows.
pub async fn lock_account_pair(
    tx: &mut dyn LedgerTx,
    first: AccountId,
    second: AccountId,
) -> Result<(Account, Account), LedgerError> {
    if first <= second {
        let a = tx.lock_account(first).await?;
        let b = tx.lock_account(second).await?;
        Ok((a, b))
    } else {
        let b = tx.lock_account(second).await?;
        let a = tx.lock_account(first).await?;
        Ok((a, b))
    }
}
