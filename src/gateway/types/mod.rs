//! Gateway types module
//!
//! - [`response`]: unified envelope, error codes, `ApiError`
//! - [`transaction`]: transaction snapshot DTO

pub mod response;
pub mod transaction;

pub use response::{ApiError, ApiResponse, ApiResult, error_codes, ok};
pub use transaction::TransactionApiData;
