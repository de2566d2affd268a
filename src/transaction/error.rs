//! Transaction Error Types

use thiserror::Error;

use crate::core_types::AccountId;
use crate::ledger::LedgerError;
use crate::money::MoneyError;
use crate::tcc::TccError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    // === Validation Errors ===
    #[error("Source and destination account cannot be the same")]
    SameAccount,

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    #[error("Invalid transaction id: {0}")]
    InvalidTransactionId(String),

    #[error("Source account not found: {0}")]
    SourceAccountNotFound(AccountId),

    #[error("Destination account not found: {0}")]
    DestinationAccountNotFound(AccountId),

    // === Business Errors ===
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Try refused for a reason other than balance
    #[error("Transfer rejected: {0}")]
    Rejected(TccError),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Transaction already exists: {0}")]
    DuplicateTransaction(String),

    // === System Errors ===
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal system error: {0}")]
    SystemError(String),
}

impl TransactionError {
    /// Error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransactionError::SameAccount => "SAME_ACCOUNT",
            TransactionError::InvalidAmount(MoneyError::PrecisionOverflow { .. }) => {
                "PRECISION_OVERFLOW"
            }
            TransactionError::InvalidAmount(_) => "INVALID_AMOUNT",
            TransactionError::InvalidTransactionId(_) => "INVALID_TRANSACTION_ID",
            TransactionError::SourceAccountNotFound(_) => "SOURCE_ACCOUNT_NOT_FOUND",
            TransactionError::DestinationAccountNotFound(_) => "DESTINATION_ACCOUNT_NOT_FOUND",
            TransactionError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransactionError::Rejected(e) => e.code(),
            TransactionError::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            TransactionError::DuplicateTransaction(_) => "DUPLICATE_TRANSACTION",
            TransactionError::DatabaseError(_) => "DATABASE_ERROR",
            TransactionError::SystemError(_) => "SYSTEM_ERROR",
        }
    }

    /// HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransactionError::SameAccount
            | TransactionError::InvalidAmount(_)
            | TransactionError::InvalidTransactionId(_)
            | TransactionError::SourceAccountNotFound(_)
            | TransactionError::DestinationAccountNotFound(_)
            | TransactionError::InsufficientBalance => 400,
            TransactionError::Rejected(e) if e.is_terminal() => 400,
            TransactionError::TransactionNotFound(_) => 404,
            TransactionError::DuplicateTransaction(_) => 409,
            TransactionError::Rejected(_)
            | TransactionError::DatabaseError(_)
            | TransactionError::SystemError(_) => 500,
        }
    }
}

impl From<sqlx::Error> for TransactionError {
    fn from(e: sqlx::Error) -> Self {
        TransactionError::DatabaseError(e.to_string())
    }
}

impl From<LedgerError> for TransactionError {
    fn from(e: LedgerError) -> Self {
        TransactionError::DatabaseError(e.to_string())
    }
}

impl From<TccError> for TransactionError {
    fn from(e: TccError) -> Self {
        match e {
            TccError::InsufficientBalance => TransactionError::InsufficientBalance,
            other => TransactionError::Rejected(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransactionError::SameAccount.code(), "SAME_ACCOUNT");
        assert_eq!(
            TransactionError::InvalidAmount(MoneyError::PrecisionOverflow {
                provided: 7,
                max: 6
            })
            .code(),
            "PRECISION_OVERFLOW"
        );
        assert_eq!(
            TransactionError::from(TccError::InsufficientBalance).code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            TransactionError::from(TccError::Rollbacked).code(),
            "ROLLBACKED"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransactionError::SameAccount.http_status(), 400);
        assert_eq!(TransactionError::InsufficientBalance.http_status(), 400);
        assert_eq!(TransactionError::SourceAccountNotFound(1).http_status(), 400);
        assert_eq!(
            TransactionError::TransactionNotFound("x".into()).http_status(),
            404
        );
        assert_eq!(TransactionError::Rejected(TccError::Overflow).http_status(), 400);
        assert_eq!(TransactionError::Rejected(TccError::Timeout).http_status(), 500);
        assert_eq!(
            TransactionError::DatabaseError("down".into()).http_status(),
            500
        );
    }
}
