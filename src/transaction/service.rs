//! Transaction Orchestrator
//!
//! Drives a transfer through Try → Confirm / Cancel.
//!
//! ```text
//! create ──▶ PENDING ──Try ok──▶ PROCESSING ──[confirm task]──▶ FULFILLED
//!               │                                    └─Rollbacked──▶ REFUNDED
//!               ├──Try unknown──▶ [cancel task] ──────────────────▶ FAILED
//!               └──Try refused─────────────────────────────────────▶ FAILED
//! ```
//!
//! A Try that timed out or hit a transient error may still have committed,
//! so the record stays PENDING until a Cancel lands. If every Cancel attempt
//! fails, the expiry sweeper picks the record up later.
//!
//! Confirm/Cancel retry loops run on their own tokio task and report the
//! final snapshot over a oneshot channel. The caller waits for that or for
//! the overall deadline, whichever comes first; the task is never aborted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::time::{Instant, timeout};
use tracing::{debug, error, info, warn};

use super::error::TransactionError;
use super::hooks::{Alert, AlertSink, EventSink, LogAlertSink, LogEventSink, TransactionEvent};
use super::state::TransactionStatus;
use super::store::TransactionStore;
use super::types::{CreateTransactionRequest, InFlightReason, Transaction, TransactionOutcome};
use crate::core_types::TransactionId;
use crate::ledger::LedgerStore;
use crate::money::parse_amount;
use crate::tcc::{Tcc, TccError, bounded};

/// Orchestrator timing and retry settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Confirm/Cancel attempts per background task
    pub max_retries: u32,
    /// Bound on every single TCC call
    pub try_timeout: Duration,
    /// Bound on how long create/retry wait for a terminal status
    pub create_timeout: Duration,
    /// Transaction TTL, after which the sweeper force-cancels
    pub expiration: chrono::Duration,
    /// Fixed sleep between attempts
    pub retry_backoff: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            try_timeout: Duration::from_secs(1),
            create_timeout: Duration::from_secs(3),
            expiration: chrono::Duration::minutes(10),
            retry_backoff: Duration::from_millis(200),
        }
    }
}

/// Transaction Orchestrator
#[derive(Clone)]
pub struct TransactionService {
    tcc: Arc<dyn Tcc>,
    ledger: Arc<dyn LedgerStore>,
    store: Arc<dyn TransactionStore>,
    alerts: Arc<dyn AlertSink>,
    events: Arc<dyn EventSink>,
    config: OrchestratorConfig,
}

impl TransactionService {
    pub fn new(
        tcc: Arc<dyn Tcc>,
        ledger: Arc<dyn LedgerStore>,
        store: Arc<dyn TransactionStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            tcc,
            ledger,
            store,
            alerts: Arc::new(LogAlertSink),
            events: Arc::new(LogEventSink),
            config,
        }
    }

    pub fn with_alert_sink(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    pub fn tcc(&self) -> &Arc<dyn Tcc> {
        &self.tcc
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub(crate) fn raise(&self, alert: Alert) {
        self.alerts.raise(alert);
    }

    // ========================================================================
    // Public operations
    // ========================================================================

    /// Validate, persist as PENDING, and drive Try → Confirm/Cancel
    ///
    /// Returns `InFlight` rather than an error when the overall deadline
    /// passes first; background work keeps going.
    pub async fn create_transaction(
        &self,
        req: CreateTransactionRequest,
    ) -> Result<TransactionOutcome, TransactionError> {
        let started = Instant::now();

        if req.source_account_id == req.destination_account_id {
            return Err(TransactionError::SameAccount);
        }
        let amount = parse_amount(&req.amount)?;

        if self.ledger.get_account(req.source_account_id).await?.is_none() {
            return Err(TransactionError::SourceAccountNotFound(
                req.source_account_id,
            ));
        }
        if self
            .ledger
            .get_account(req.destination_account_id)
            .await?
            .is_none()
        {
            return Err(TransactionError::DestinationAccountNotFound(
                req.destination_account_id,
            ));
        }

        let txn = Transaction::new(
            req.source_account_id,
            req.destination_account_id,
            amount,
            self.config.expiration,
        );
        self.store.create(&txn).await?;
        self.events.publish(TransactionEvent::Created(txn.clone()));

        self.drive(txn, started).await
    }

    /// Re-drive a non-terminal transaction; terminal ones come back unchanged
    pub async fn retry_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionOutcome, TransactionError> {
        let started = Instant::now();
        let txn = self.query_transaction(transaction_id).await?;

        if txn.status.is_terminal() {
            debug!(transaction_id = %transaction_id, status = %txn.status, "Retry: already terminal");
            return Ok(TransactionOutcome::Settled(txn));
        }

        info!(transaction_id = %transaction_id, status = %txn.status, "Retrying transaction");
        self.drive(txn, started).await
    }

    pub async fn query_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Transaction, TransactionError> {
        self.store
            .get(transaction_id)
            .await?
            .ok_or_else(|| TransactionError::TransactionNotFound(transaction_id.to_string()))
    }

    // ========================================================================
    // Driving
    // ========================================================================

    async fn drive(
        &self,
        txn: Transaction,
        started: Instant,
    ) -> Result<TransactionOutcome, TransactionError> {
        let id = txn.transaction_id;

        let tried = bounded(
            self.config.try_timeout,
            self.tcc.try_transfer(
                &id,
                txn.source_account_id,
                txn.destination_account_id,
                txn.amount,
            ),
        )
        .await;

        let rx = match tried {
            Ok(()) => {
                let txn = self.transition(&txn, TransactionStatus::Processing).await?;
                if txn.status.is_terminal() {
                    return Ok(TransactionOutcome::Settled(txn));
                }
                self.spawn_confirm(txn)
            }
            Err(TccError::Rollbacked) => {
                // Already compensated, e.g. by the sweeper or an empty rollback
                let txn = self.transition(&txn, TransactionStatus::Failed).await?;
                return Ok(TransactionOutcome::Settled(txn));
            }
            Err(e) if e.is_retryable() => {
                // The Try may have committed; stays PENDING until Cancel lands
                warn!(transaction_id = %id, error = %e, "Try outcome unknown, compensating");
                self.spawn_cancel(txn)
            }
            Err(e) => {
                warn!(transaction_id = %id, error = %e, "Try refused");
                self.transition(&txn, TransactionStatus::Failed).await?;
                return Err(e.into());
            }
        };

        let remaining = self
            .config
            .create_timeout
            .saturating_sub(started.elapsed());
        match timeout(remaining, rx).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => {
                error!(transaction_id = %id, "Background task ended without reporting");
                Ok(TransactionOutcome::InFlight {
                    transaction: self.query_transaction(&id).await?,
                    reason: InFlightReason::RetriesExhausted,
                })
            }
            Err(_) => {
                info!(transaction_id = %id, "Deadline exceeded, returning in-flight snapshot");
                Ok(TransactionOutcome::InFlight {
                    transaction: self.query_transaction(&id).await?,
                    reason: InFlightReason::DeadlineExceeded,
                })
            }
        }
    }

    fn spawn_confirm(&self, txn: Transaction) -> oneshot::Receiver<TransactionOutcome> {
        let (tx, rx) = oneshot::channel();
        let service = self.clone();
        tokio::spawn(async move {
            let outcome = service.confirm_with_retries(txn).await;
            // Receiver may have stopped waiting
            let _ = tx.send(outcome);
        });
        rx
    }

    fn spawn_cancel(&self, txn: Transaction) -> oneshot::Receiver<TransactionOutcome> {
        let (tx, rx) = oneshot::channel();
        let service = self.clone();
        tokio::spawn(async move {
            let outcome = service.cancel_with_retries(txn).await;
            let _ = tx.send(outcome);
        });
        rx
    }

    async fn confirm_with_retries(&self, mut txn: Transaction) -> TransactionOutcome {
        let id = txn.transaction_id;
        let attempts = self.config.max_retries.max(1);

        for attempt in 1..=attempts {
            txn.retries = attempt;
            match bounded(self.config.try_timeout, self.tcc.confirm(&id)).await {
                Ok(()) => return self.settle(txn, TransactionStatus::Fulfilled).await,
                Err(TccError::Rollbacked) => {
                    info!(transaction_id = %id, "Confirm refused, already rolled back");
                    return self.settle(txn, TransactionStatus::Refunded).await;
                }
                Err(e) if e.is_terminal() => {
                    self.alerts.raise(Alert::ProtocolViolation {
                        transaction_id: id,
                        error: e,
                    });
                    return self.unresolved(txn).await;
                }
                Err(e) => {
                    warn!(transaction_id = %id, attempt, error = %e, "Confirm failed");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_backoff).await;
            }
        }

        self.alerts.raise(Alert::ConfirmRetriesExhausted {
            transaction_id: id,
            attempts,
        });
        self.unresolved(txn).await
    }

    async fn cancel_with_retries(&self, mut txn: Transaction) -> TransactionOutcome {
        let id = txn.transaction_id;
        let attempts = self.config.max_retries.max(1);

        for attempt in 1..=attempts {
            txn.retries = attempt;
            match bounded(self.config.try_timeout, self.tcc.cancel(&id)).await {
                Ok(outcome) => {
                    debug!(transaction_id = %id, outcome = %outcome, "Cancel succeeded");
                    return self.settle(txn, TransactionStatus::Failed).await;
                }
                Err(TccError::Confirmed) => {
                    info!(transaction_id = %id, "Cancel refused, already confirmed");
                    return self.settle(txn, TransactionStatus::Fulfilled).await;
                }
                Err(e) if e.is_terminal() => {
                    self.alerts.raise(Alert::ProtocolViolation {
                        transaction_id: id,
                        error: e,
                    });
                    return self.unresolved(txn).await;
                }
                Err(e) => {
                    warn!(transaction_id = %id, attempt, error = %e, "Cancel failed");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_backoff).await;
            }
        }

        self.alerts.raise(Alert::CancelRetriesExhausted {
            transaction_id: id,
            attempts,
        });
        self.unresolved(txn).await
    }

    /// Write the terminal status the TCC result dictates
    async fn settle(&self, txn: Transaction, to: TransactionStatus) -> TransactionOutcome {
        match self.transition(&txn, to).await {
            Ok(settled) if settled.status.is_terminal() => TransactionOutcome::Settled(settled),
            Ok(other) => TransactionOutcome::InFlight {
                transaction: other,
                reason: InFlightReason::RetriesExhausted,
            },
            Err(e) => {
                // Ledger already settled; the sweeper finalizes the record later
                error!(transaction_id = %txn.transaction_id, to = %to, error = %e, "Status write failed");
                TransactionOutcome::InFlight {
                    transaction: txn,
                    reason: InFlightReason::RetriesExhausted,
                }
            }
        }
    }

    async fn unresolved(&self, txn: Transaction) -> TransactionOutcome {
        let transaction = match self.reload(&txn).await {
            Ok(current) => current,
            Err(_) => txn,
        };
        TransactionOutcome::InFlight {
            transaction,
            reason: InFlightReason::RetriesExhausted,
        }
    }

    async fn reload(&self, txn: &Transaction) -> Result<Transaction, TransactionError> {
        let mut current = self.query_transaction(&txn.transaction_id).await?;
        current.retries = txn.retries;
        Ok(current)
    }

    /// CAS the status forward from the last observed value
    ///
    /// A lost CAS re-reads and tries again from the newer status. Returns the
    /// current snapshot, which is already past `to` if another writer won.
    pub(crate) async fn transition(
        &self,
        txn: &Transaction,
        to: TransactionStatus,
    ) -> Result<Transaction, TransactionError> {
        let mut current = txn.clone();
        while current.status.can_transition_to(to) {
            let updated = self
                .store
                .update_status_if(&current.transaction_id, &[current.status], to)
                .await?;
            if updated {
                self.events.publish(TransactionEvent::StatusChanged {
                    transaction_id: current.transaction_id,
                    from: current.status,
                    to,
                });
                current.status = to;
                current.updated_at = Utc::now();
                return Ok(current);
            }
            current = self.reload(&current).await?;
        }
        Ok(current)
    }
}
