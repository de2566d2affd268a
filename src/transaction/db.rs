//! Transaction Database Layer
//!
//! PostgreSQL persistence for `transactions_tb`.
//! All status updates use atomic CAS (Compare-And-Swap) operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::error::TransactionError;
use super::state::TransactionStatus;
use super::store::TransactionStore;
use super::types::Transaction;
use crate::core_types::TransactionId;
use crate::money::Amount;

const COLUMNS: &str = "transaction_id, source_account_id, destination_account_id, amount, \
     status, expired_at, created_at, updated_at";

/// Transaction database operations
pub struct TransactionDb {
    pool: PgPool,
}

impl TransactionDb {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_transaction(row: &PgRow) -> Result<Transaction, TransactionError> {
        let id_str: String = row.try_get("transaction_id")?;
        let transaction_id: TransactionId = id_str.parse().map_err(|_| {
            TransactionError::SystemError(format!("Invalid transaction_id: {}", id_str))
        })?;

        let status_id: i16 = row.try_get("status")?;
        let status = TransactionStatus::from_id(status_id).ok_or_else(|| {
            TransactionError::SystemError(format!("Invalid status ID: {}", status_id))
        })?;

        let amount = Amount::from_scaled(row.try_get("amount")?)
            .map_err(|e| TransactionError::SystemError(format!("Invalid amount: {}", e)))?;

        Ok(Transaction {
            transaction_id,
            source_account_id: row.try_get("source_account_id")?,
            destination_account_id: row.try_get("destination_account_id")?,
            amount,
            status,
            expired_at: row.try_get("expired_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            retries: 0,
        })
    }
}

#[async_trait]
impl TransactionStore for TransactionDb {
    async fn create(&self, txn: &Transaction) -> Result<(), TransactionError> {
        sqlx::query(
            r#"
            INSERT INTO transactions_tb
                (transaction_id, source_account_id, destination_account_id, amount, status, expired_at, created_at, updated_at)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, $7)
            "#,
        )
        .bind(txn.transaction_id.to_string())
        .bind(txn.source_account_id)
        .bind(txn.destination_account_id)
        .bind(txn.amount.scaled())
        .bind(txn.status.id())
        .bind(txn.expired_at)
        .bind(txn.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false);
            if duplicate {
                TransactionError::DuplicateTransaction(txn.transaction_id.to_string())
            } else {
                e.into()
            }
        })?;

        Ok(())
    }

    async fn get(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Transaction>, TransactionError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions_tb WHERE transaction_id = $1",
            COLUMNS
        ))
        .bind(transaction_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    async fn update_status_if(
        &self,
        transaction_id: &TransactionId,
        expected: &[TransactionStatus],
        new_status: TransactionStatus,
    ) -> Result<bool, TransactionError> {
        let expected_ids: Vec<i16> = expected.iter().map(|s| s.id()).collect();
        let result = sqlx::query(
            r#"
            UPDATE transactions_tb
            SET status = $1, updated_at = NOW()
            WHERE transaction_id = $2 AND status = ANY($3)
            "#,
        )
        .bind(new_status.id())
        .bind(transaction_id.to_string())
        .bind(&expected_ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_expired(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM transactions_tb
            WHERE status IN ($1, $2) AND expired_at < $3
            ORDER BY expired_at ASC
            LIMIT $4
            "#,
            COLUMNS
        ))
        .bind(TransactionStatus::Pending.id())
        .bind(TransactionStatus::Processing.id())
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_transaction).collect()
    }
}
