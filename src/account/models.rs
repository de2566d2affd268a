//! Account request/response models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::AccountId;
use crate::ledger::Account;

/// Create account request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Positive business key chosen by the caller
    pub account_id: AccountId,
    /// Decimal string; empty means zero
    #[serde(default)]
    #[schema(example = "100.00")]
    pub initial_balance: String,
}

/// Account balance view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountView {
    pub account_id: AccountId,
    /// Balance with 6 fractional digits
    #[schema(example = "100.000000")]
    pub balance: String,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id,
            balance: account.balance.format(),
        }
    }
}
