//! HTTP handlers

pub mod account;
pub mod health;
pub mod transaction;

pub use account::{create_account, get_account};
pub use health::{HealthResponse, health_check};
pub use transaction::{create_transaction, get_transaction, retry_transaction};
