//! Alert and event hooks
//!
//! [`AlertSink`] receives conditions that need an operator: exhausted
//! Confirm/Cancel retries, protocol violations, sweeper overload.
//! [`EventSink`] receives every successful status write. A transactional
//! message-queue producer plugs in here; the bundled sinks log or forward
//! onto an mpsc channel.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::state::TransactionStatus;
use super::types::Transaction;
use crate::core_types::TransactionId;
use crate::tcc::TccError;

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// Confirm kept failing; the transaction stays PROCESSING
    ConfirmRetriesExhausted {
        transaction_id: TransactionId,
        attempts: u32,
    },
    /// Cancel kept failing; the transaction stays unresolved
    CancelRetriesExhausted {
        transaction_id: TransactionId,
        attempts: u32,
    },
    /// The TCC engine answered with a state that contradicts our record
    ProtocolViolation {
        transaction_id: TransactionId,
        error: TccError,
    },
    /// More expired transactions than one sweep page
    SweepOverloaded { page_size: usize },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::ConfirmRetriesExhausted {
                transaction_id,
                attempts,
            } => write!(f, "confirm retries exhausted for {} after {} attempts", transaction_id, attempts),
            Alert::CancelRetriesExhausted {
                transaction_id,
                attempts,
            } => write!(f, "cancel retries exhausted for {} after {} attempts", transaction_id, attempts),
            Alert::ProtocolViolation {
                transaction_id,
                error,
            } => write!(f, "protocol violation on {}: {}", transaction_id, error),
            Alert::SweepOverloaded { page_size } => {
                write!(f, "more than {} expired transactions pending", page_size)
            }
        }
    }
}

pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: Alert);
}

/// Logs alerts at `error!`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn raise(&self, alert: Alert) {
        error!(alert = %alert, "ALERT");
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionEvent {
    Created(Transaction),
    StatusChanged {
        transaction_id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
    },
}

pub trait EventSink: Send + Sync {
    fn publish(&self, event: TransactionEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn publish(&self, event: TransactionEvent) {
        match event {
            TransactionEvent::Created(txn) => info!(
                transaction_id = %txn.transaction_id,
                source = txn.source_account_id,
                destination = txn.destination_account_id,
                amount = %txn.amount,
                "Transaction created"
            ),
            TransactionEvent::StatusChanged {
                transaction_id,
                from,
                to,
            } => info!(
                transaction_id = %transaction_id,
                from = %from,
                to = %to,
                "Transaction status changed"
            ),
        }
    }
}

/// Forwards events onto a bounded channel; drops with a warning when full
#[derive(Clone)]
pub struct ChannelEventSink {
    tx: mpsc::Sender<TransactionEvent>,
}

impl EventSink for ChannelEventSink {
    fn publish(&self, event: TransactionEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!(error = %e, "Dropping transaction event");
        }
    }
}

/// Create a new event channel pair
pub fn event_channel(buffer: usize) -> (ChannelEventSink, mpsc::Receiver<TransactionEvent>) {
    let (tx, rx) = mpsc::channel(buffer);
    (ChannelEventSink { tx }, rx)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_forwards_and_drops_when_full() {
        let (sink, mut rx) = event_channel(1);
        let id = TransactionId::new();
        let changed = TransactionEvent::StatusChanged {
            transaction_id: id,
            from: TransactionStatus::Pending,
            to: TransactionStatus::Processing,
        };

        sink.publish(changed.clone());
        // Buffer is full, this one is dropped
        sink.publish(TransactionEvent::StatusChanged {
            transaction_id: id,
            from: TransactionStatus::Processing,
            to: TransactionStatus::Fulfilled,
        });

        assert_eq!(rx.recv().await, Some(changed));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_alert_display() {
        let alert = Alert::SweepOverloaded { page_size: 200 };
        assert_eq!(alert.to_string(), "more than 200 expired transactions pending");
    }
}
