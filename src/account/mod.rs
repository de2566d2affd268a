//! Account management module
//!
//! Creates accounts with an initial balance and reads balances back. Balance
//! changes after creation only ever go through the TCC engine.

pub mod error;
pub mod models;
pub mod service;

pub use error::AccountError;
pub use models::{AccountView, CreateAccountRequest};
pub use service::AccountService;
