//! Account ledger store errors

use thiserror::Error;

use crate::core_types::AccountId;
use crate::money::MoneyError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Account already exists: {0}")]
    DuplicateAccount(AccountId),

    #[error("Invalid account id: {0}")]
    InvalidAccountId(AccountId),

    /// Lost a creation race on the fund movement unique key
    #[error("Fund movement already exists: {0}")]
    DuplicateFundMovement(String),

    #[error("Fund movement not found: {0}")]
    FundMovementNotFound(String),

    #[error("Row lock not held: {0}")]
    LockNotHeld(String),

    #[error("Corrupted record: {0}")]
    Corrupted(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Database(e.to_string())
    }
}

impl From<MoneyError> for LedgerError {
    fn from(e: MoneyError) -> Self {
        LedgerError::Corrupted(e.to_string())
    }
}
