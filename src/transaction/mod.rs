//! Transaction orchestration
//!
//! Transaction records live in their own store, separate from the account
//! ledger. The two are never written in one atomic unit; the TCC protocol
//! plus the expiry sweeper keep them consistent.
//!
//! # Modules
//!
//! - [`state`] - status enum and legal transitions
//! - [`store`] - store trait and the in-memory implementation
//! - [`db`] - PostgreSQL implementation
//! - [`service`] - create / retry / query orchestration
//! - [`sweeper`] - force-cancel of expired transactions
//! - [`hooks`] - alert and event sinks

pub mod db;
pub mod error;
pub mod hooks;
pub mod service;
pub mod state;
pub mod store;
pub mod sweeper;
pub mod types;

pub use db::TransactionDb;
pub use error::TransactionError;
pub use hooks::{
    Alert, AlertSink, ChannelEventSink, EventSink, LogAlertSink, LogEventSink, TransactionEvent,
    event_channel,
};
pub use service::{OrchestratorConfig, TransactionService};
pub use state::TransactionStatus;
pub use store::{MemoryTransactionStore, TransactionStore};
pub use sweeper::{ExpirySweeper, SweepReport, SweeperConfig};
pub use types::{
    CreateTransactionRequest, InFlightReason, RetryTransactionRequest, Transaction,
    TransactionOutcome,
};
