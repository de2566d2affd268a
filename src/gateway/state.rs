use std::sync::Arc;

use crate::account::AccountService;
use crate::db::Database;
use crate::transaction::TransactionService;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub transactions: TransactionService,
    /// Pools pinged by the health check; empty on the memory backend
    pub databases: Vec<(&'static str, Arc<Database>)>,
}

impl AppState {
    pub fn new(accounts: AccountService, transactions: TransactionService) -> Self {
        Self {
            accounts,
            transactions,
            databases: Vec::new(),
        }
    }

    pub fn with_database(mut self, name: &'static str, db: Arc<Database>) -> Self {
        self.databases.push((name, db));
        self
    }
}
