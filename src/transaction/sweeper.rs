//! Expiry Sweeper
//!
//! Background worker that force-cancels expired PENDING/PROCESSING
//! transactions so no reservation stays on hold forever.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::error::TransactionError;
use super::hooks::Alert;
use super::service::TransactionService;
use super::state::TransactionStatus;
use super::types::Transaction;
use crate::tcc::{TccError, bounded};

/// Configuration for the expiry sweeper
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to scan for expired transactions
    pub interval: Duration,
    /// Maximum transactions processed per sweep
    pub page_size: usize,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            page_size: 200,
        }
    }
}

/// Counters for one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired transactions picked up this sweep
    pub scanned: usize,
    /// Finalized as FAILED after Cancel
    pub failed: usize,
    /// Finalized as FULFILLED because Cancel found them confirmed
    pub fulfilled: usize,
    /// Left for the next sweep (transient failure or lost race)
    pub deferred: usize,
    /// More expired rows existed than one page
    pub overloaded: bool,
}

enum SweepResult {
    Failed,
    Fulfilled,
    Deferred,
}

/// Expiry Sweeper
///
/// Per expired transaction: Cancel (an empty rollback is fine), then force
/// the status to FAILED. A Cancel that reports the transfer already
/// confirmed finalizes it as FULFILLED instead.
pub struct ExpirySweeper {
    service: TransactionService,
    config: SweeperConfig,
}

impl ExpirySweeper {
    pub fn new(service: TransactionService, config: SweeperConfig) -> Self {
        Self { service, config }
    }

    pub fn with_defaults(service: TransactionService) -> Self {
        Self::new(service, SweeperConfig::default())
    }

    /// Run the sweeper loop
    ///
    /// This method runs forever, sweeping once per interval.
    pub async fn run(&self) -> ! {
        info!(
            interval_secs = self.config.interval.as_secs(),
            page_size = self.config.page_size,
            "Starting expiry sweeper"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_once(Utc::now()).await {
                error!(error = %e, "Expiry sweep failed");
            }
        }
    }

    /// Run a single sweep against `now`
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepReport, TransactionError> {
        let mut expired = self
            .service
            .store()
            .find_expired(now, self.config.page_size + 1)
            .await?;

        let mut report = SweepReport::default();
        if expired.len() > self.config.page_size {
            expired.truncate(self.config.page_size);
            report.overloaded = true;
            warn!(page_size = self.config.page_size, "Too many expired transactions");
            self.service.raise(Alert::SweepOverloaded {
                page_size: self.config.page_size,
            });
        }

        if expired.is_empty() {
            debug!("No expired transactions found");
            return Ok(report);
        }

        report.scanned = expired.len();
        info!(count = report.scanned, "Found expired transactions");

        let results = join_all(expired.into_iter().map(|txn| self.invalidate(txn))).await;
        for result in results {
            match result {
                SweepResult::Failed => report.failed += 1,
                SweepResult::Fulfilled => report.fulfilled += 1,
                SweepResult::Deferred => report.deferred += 1,
            }
        }

        info!(
            failed = report.failed,
            fulfilled = report.fulfilled,
            deferred = report.deferred,
            "Expiry sweep finished"
        );
        Ok(report)
    }

    async fn invalidate(&self, txn: Transaction) -> SweepResult {
        let id = txn.transaction_id;
        let call_timeout = self.service.config().try_timeout;

        let target = match bounded(call_timeout, self.service.tcc().cancel(&id)).await {
            Ok(outcome) => {
                debug!(transaction_id = %id, outcome = %outcome, "Expired transaction canceled");
                TransactionStatus::Failed
            }
            Err(TccError::Confirmed) => TransactionStatus::Fulfilled,
            Err(e) => {
                if e.is_terminal() {
                    self.service.raise(Alert::ProtocolViolation {
                        transaction_id: id,
                        error: e.clone(),
                    });
                }
                warn!(transaction_id = %id, error = %e, "Cancel of expired transaction failed");
                return SweepResult::Deferred;
            }
        };

        match self.service.transition(&txn, target).await {
            Ok(updated) if updated.status == target => match target {
                TransactionStatus::Fulfilled => SweepResult::Fulfilled,
                _ => SweepResult::Failed,
            },
            Ok(updated) => {
                // Another writer finalized it first
                debug!(transaction_id = %id, status = %updated.status, "Already finalized");
                match updated.status {
                    TransactionStatus::Fulfilled => SweepResult::Fulfilled,
                    TransactionStatus::Failed | TransactionStatus::Refunded => SweepResult::Failed,
                    _ => SweepResult::Deferred,
                }
            }
            Err(e) => {
                error!(transaction_id = %id, error = %e, "Failed to finalize expired transaction");
                SweepResult::Deferred
            }
        }
    }
}
