//! TCC Error Types

use thiserror::Error;

use crate::core_types::AccountId;
use crate::ledger::LedgerError;
use crate::money::MoneyError;

/// TCC error types
///
/// `Rollbacked`, `Confirmed` and `PaymentNotDone` are protocol violations:
/// the fund movement is already in a state that forbids the call. They are
/// terminal and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TccError {
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Fund movement was canceled (possibly an empty rollback)
    #[error("Transaction already rolled back")]
    Rollbacked,

    /// Cancel arrived after the fund movement was confirmed
    #[error("Transaction already confirmed")]
    Confirmed,

    /// Confirm arrived before any Try
    #[error("Payment not done")]
    PaymentNotDone,

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Amount would cause overflow")]
    Overflow,

    /// Call did not finish within the per-call deadline
    #[error("Operation timed out")]
    Timeout,

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl TccError {
    /// Protocol violation or business rejection; retrying cannot change the answer
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TccError::InsufficientBalance
                | TccError::Rollbacked
                | TccError::Confirmed
                | TccError::PaymentNotDone
                | TccError::AccountNotFound(_)
                | TccError::Overflow
        )
    }

    /// Transient storage/lock failure or timeout
    #[inline]
    pub fn is_retryable(&self) -> bool {
        !self.is_terminal()
    }

    pub fn code(&self) -> &'static str {
        match self {
            TccError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TccError::Rollbacked => "ROLLBACKED",
            TccError::Confirmed => "CONFIRMED",
            TccError::PaymentNotDone => "PAYMENT_NOT_DONE",
            TccError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TccError::Overflow => "OVERFLOW",
            TccError::Timeout => "TIMEOUT",
            TccError::Ledger(_) => "LEDGER_ERROR",
        }
    }
}

impl From<LedgerError> for TccError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::AccountNotFound(id) => TccError::AccountNotFound(id),
            other => TccError::Ledger(other),
        }
    }
}

impl From<tokio::time::error::Elapsed> for TccError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        TccError::Timeout
    }
}

impl From<MoneyError> for TccError {
    fn from(e: MoneyError) -> Self {
        match e {
            MoneyError::Negative => TccError::InsufficientBalance,
            MoneyError::Overflow => TccError::Overflow,
            other => TccError::Ledger(LedgerError::Corrupted(other.to_string())),
        }
    }
}
