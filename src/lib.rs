//! TCC Ledger - account transfers with Try-Confirm-Cancel
//!
//! Balances live in the account ledger; transfer records live in a separate
//! transaction store. A transfer reserves funds (Try), then either credits
//! the destination (Confirm) or returns the reservation (Cancel). An expiry
//! sweeper force-cancels anything left unresolved past its deadline.
//!
//! # Modules
//!
//! - [`core_types`] - identifiers (AccountId, TransactionId)
//! - [`money`] - fixed-point `Amount`
//! - [`ledger`] - accounts and fund movements with row locking
//! - [`tcc`] - Try / Confirm / Cancel engine
//! - [`transaction`] - orchestrator, transaction store, expiry sweeper
//! - [`account`] - account creation and balance queries
//! - [`gateway`] - HTTP API
//! - [`config`], [`logging`], [`db`], [`bootstrap`] - process plumbing

// Core types - must be first!
pub mod core_types;
pub mod money;

// Ledger and protocol
pub mod ledger;
pub mod tcc;
pub mod transaction;

// Services and surface
pub mod account;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use core_types::{AccountId, TransactionId};
pub use money::{Amount, MoneyError, parse_amount};
pub use tcc::{CancelOutcome, Tcc, TccEngine, TccError};
pub use transaction::{
    ExpirySweeper, Transaction, TransactionError, TransactionOutcome, TransactionService,
    TransactionStatus,
};
