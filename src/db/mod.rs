//! Database connection management
//!
//! The account ledger and the transaction store each get their own pool;
//! they may point at different PostgreSQL databases.

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

static ACCOUNT_MIGRATOR: Migrator = sqlx::migrate!("./migrations/account");
static TRANSACTION_MIGRATOR: Migrator = sqlx::migrate!("./migrations/transaction");

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create `accounts_tb` and `fund_movements_tb`
    pub async fn migrate_account_schema(&self) -> Result<(), sqlx::Error> {
        ACCOUNT_MIGRATOR.run(&self.pool).await?;
        tracing::info!("Account schema up to date");
        Ok(())
    }

    /// Create `transactions_tb`
    pub async fn migrate_transaction_schema(&self) -> Result<(), sqlx::Error> {
        TRANSACTION_MIGRATOR.run(&self.pool).await?;
        tracing::info!("Transaction schema up to date");
        Ok(())
    }
}
