//! Account Ledger Store
//!
//! Accounts and per-transaction fund movements, the state the TCC engine
//! mutates. Two backends implement [`LedgerStore`]:
//!
//! - [`PgLedgerStore`] - PostgreSQL, `SELECT ... FOR UPDATE` row locks
//! - [`MemoryLedgerStore`] - in-process, per-row async mutexes
//!
//! Both give the same guarantees: locking reads block until the holding
//! storage transaction ends, and a transaction dropped without commit leaves
//! no trace.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use error::LedgerError;
pub use memory::MemoryLedgerStore;
pub use models::{Account, FundMovement, FundMovementStage};
pub use postgres::PgLedgerStore;
pub use store::{LedgerStore, LedgerTx, lock_account_pair};
