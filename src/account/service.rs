//! Account service

use std::sync::Arc;

use tracing::info;

use super::error::AccountError;
use super::models::{AccountView, CreateAccountRequest};
use crate::core_types::AccountId;
use crate::ledger::LedgerStore;
use crate::money::{Amount, parse_amount};

#[derive(Clone)]
pub struct AccountService {
    ledger: Arc<dyn LedgerStore>,
}

impl AccountService {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    pub async fn create_account(
        &self,
        req: CreateAccountRequest,
    ) -> Result<AccountView, AccountError> {
        if req.account_id <= 0 {
            return Err(AccountError::InvalidAccountId(req.account_id));
        }
        let balance = if req.initial_balance.trim().is_empty() {
            Amount::ZERO
        } else {
            parse_amount(&req.initial_balance)?
        };

        let account = self.ledger.create_account(req.account_id, balance).await?;
        info!(
            account_id = account.account_id,
            balance = %account.balance,
            "Account created"
        );
        Ok(AccountView::from(&account))
    }

    pub async fn query_account(&self, account_id: AccountId) -> Result<AccountView, AccountError> {
        self.ledger
            .get_account(account_id)
            .await?
            .map(|account| AccountView::from(&account))
            .ok_or(AccountError::AccountNotFound(account_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedgerStore;
    use crate::money::MoneyError;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryLedgerStore::new()))
    }

    fn request(account_id: AccountId, initial_balance: &str) -> CreateAccountRequest {
        CreateAccountRequest {
            account_id,
            initial_balance: initial_balance.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_query() {
        let svc = service();
        let created = svc.create_account(request(10, "100.5")).await.unwrap();
        assert_eq!(
            created,
            AccountView {
                account_id: 10,
                balance: "100.500000".to_string()
            }
        );
        assert_eq!(svc.query_account(10).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_empty_balance_is_zero() {
        let svc = service();
        let created = svc.create_account(request(11, "")).await.unwrap();
        assert_eq!(created.balance, "0.000000");
    }

    #[tokio::test]
    async fn test_rejections() {
        let svc = service();
        svc.create_account(request(12, "1")).await.unwrap();

        assert_eq!(
            svc.create_account(request(12, "1")).await,
            Err(AccountError::DuplicateAccount(12))
        );
        assert_eq!(
            svc.create_account(request(0, "1")).await,
            Err(AccountError::InvalidAccountId(0))
        );
        assert_eq!(
            svc.create_account(request(13, "-5")).await,
            Err(AccountError::InvalidBalance(MoneyError::Negative))
        );
        assert_eq!(
            svc.query_account(404).await,
            Err(AccountError::AccountNotFound(404))
        );
    }
}
