//! Account Error Types

use thiserror::Error;

use crate::core_types::AccountId;
use crate::ledger::LedgerError;
use crate::money::MoneyError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Invalid account id: {0}")]
    InvalidAccountId(AccountId),

    #[error("Invalid balance: {0}")]
    InvalidBalance(#[from] MoneyError),

    #[error("Account already exists: {0}")]
    DuplicateAccount(AccountId),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AccountError {
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::InvalidAccountId(_) => "INVALID_ACCOUNT_ID",
            AccountError::InvalidBalance(_) => "INVALID_BALANCE",
            AccountError::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            AccountError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            AccountError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AccountError::InvalidAccountId(_) | AccountError::InvalidBalance(_) => 400,
            AccountError::DuplicateAccount(_) => 409,
            AccountError::AccountNotFound(_) => 404,
            AccountError::DatabaseError(_) => 500,
        }
    }
}

impl From<LedgerError> for AccountError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidAccountId(id) => AccountError::InvalidAccountId(id),
            LedgerError::DuplicateAccount(id) => AccountError::DuplicateAccount(id),
            LedgerError::AccountNotFound(id) => AccountError::AccountNotFound(id),
            other => AccountError::DatabaseError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_mapping() {
        assert_eq!(
            AccountError::from(LedgerError::DuplicateAccount(3)),
            AccountError::DuplicateAccount(3)
        );
        assert_eq!(AccountError::DuplicateAccount(3).http_status(), 409);
        assert_eq!(
            AccountError::from(LedgerError::Database("gone".into())).code(),
            "DATABASE_ERROR"
        );
    }
}
