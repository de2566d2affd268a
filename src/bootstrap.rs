//! Service wiring shared by the binaries
//!
//! Builds the ledger, TCC engine, transaction store and services for the
//! configured storage backend. Services are built once and shared by `Arc`.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::account::AccountService;
use crate::config::{AppConfig, StorageBackend, StorageConfig};
use crate::db::Database;
use crate::gateway::AppState;
use crate::ledger::{LedgerStore, MemoryLedgerStore, PgLedgerStore};
use crate::tcc::{Tcc, TccEngine};
use crate::transaction::{
    ExpirySweeper, MemoryTransactionStore, OrchestratorConfig, SweeperConfig, TransactionDb,
    TransactionService, TransactionStore,
};

/// Everything a binary needs
pub struct Services {
    pub accounts: AccountService,
    pub transactions: TransactionService,
    /// Named pools for health checks; empty on the memory backend
    pub databases: Vec<(&'static str, Arc<Database>)>,
}

impl Services {
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let (ledger, store, databases) = match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage backend");
                let ledger: Arc<dyn LedgerStore> = Arc::new(MemoryLedgerStore::new());
                let store: Arc<dyn TransactionStore> = Arc::new(MemoryTransactionStore::new());
                (ledger, store, Vec::new())
            }
            StorageBackend::Postgres => {
                let (account_db, transaction_db) = connect_postgres(&config.storage).await?;
                let ledger: Arc<dyn LedgerStore> =
                    Arc::new(PgLedgerStore::new(account_db.pool().clone()));
                let store: Arc<dyn TransactionStore> =
                    Arc::new(TransactionDb::new(transaction_db.pool().clone()));
                (
                    ledger,
                    store,
                    vec![("account", account_db), ("transaction", transaction_db)],
                )
            }
        };

        let tcc: Arc<dyn Tcc> = Arc::new(TccEngine::new(ledger.clone()));
        let transactions = TransactionService::new(
            tcc,
            ledger.clone(),
            store,
            OrchestratorConfig::from(&config.tcc),
        );

        Ok(Self {
            accounts: AccountService::new(ledger),
            transactions,
            databases,
        })
    }

    pub fn sweeper(&self, config: &AppConfig) -> ExpirySweeper {
        ExpirySweeper::new(
            self.transactions.clone(),
            SweeperConfig::from(&config.sweeper),
        )
    }

    pub fn app_state(&self) -> AppState {
        self.databases.iter().fold(
            AppState::new(self.accounts.clone(), self.transactions.clone()),
            |state, (name, db)| state.with_database(name, db.clone()),
        )
    }
}

async fn connect_postgres(
    storage: &StorageConfig,
) -> anyhow::Result<(Arc<Database>, Arc<Database>)> {
    let account_url = storage
        .account_db_url
        .as_deref()
        .context("storage.account_db_url is required for the postgres backend")?;
    let transaction_url = storage
        .transaction_db_url
        .as_deref()
        .context("storage.transaction_db_url is required for the postgres backend")?;

    let account_db = Database::connect(account_url, storage.max_connections)
        .await
        .context("Failed to connect to account database")?;
    let transaction_db = Database::connect(transaction_url, storage.max_connections)
        .await
        .context("Failed to connect to transaction database")?;

    if storage.run_migrations {
        account_db
            .migrate_account_schema()
            .await
            .context("Account schema migration failed")?;
        transaction_db
            .migrate_transaction_schema()
            .await
            .context("Transaction schema migration failed")?;
    }

    Ok((Arc::new(account_db), Arc::new(transaction_db)))
}
