//! API Response types and error codes

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::account::AccountError;
use crate::transaction::TransactionError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or absent (error)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const TRANSACTION_REJECTED: i32 = 1003;

    // Resource errors (4xxx)
    pub const ACCOUNT_NOT_FOUND: i32 = 4001;
    pub const TRANSACTION_NOT_FOUND: i32 = 4002;
    pub const DUPLICATE: i32 = 4009;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

// ============================================================================
// ApiError
// ============================================================================

/// Error half of every handler result, rendered as `{code, msg}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap `data` in a success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn into_err<T>(self) -> Result<T, Self> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, msg = %self.msg, "Request failed");
        }
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

fn status_of(http_status: u16) -> StatusCode {
    StatusCode::from_u16(http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<TransactionError> for ApiError {
    fn from(e: TransactionError) -> Self {
        let code = match &e {
            TransactionError::SameAccount
            | TransactionError::InvalidAmount(_)
            | TransactionError::InvalidTransactionId(_)
            | TransactionError::SourceAccountNotFound(_)
            | TransactionError::DestinationAccountNotFound(_) => error_codes::INVALID_PARAMETER,
            TransactionError::InsufficientBalance => error_codes::INSUFFICIENT_BALANCE,
            TransactionError::Rejected(tcc) if tcc.is_terminal() => {
                error_codes::TRANSACTION_REJECTED
            }
            TransactionError::TransactionNotFound(_) => error_codes::TRANSACTION_NOT_FOUND,
            TransactionError::DuplicateTransaction(_) => error_codes::DUPLICATE,
            TransactionError::Rejected(_)
            | TransactionError::DatabaseError(_)
            | TransactionError::SystemError(_) => error_codes::INTERNAL_ERROR,
        };
        Self::new(
            status_of(e.http_status()),
            code,
            format!("{}: {}", e.code(), e),
        )
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        let code = match &e {
            AccountError::InvalidAccountId(_) | AccountError::InvalidBalance(_) => {
                error_codes::INVALID_PARAMETER
            }
            AccountError::DuplicateAccount(_) => error_codes::DUPLICATE,
            AccountError::AccountNotFound(_) => error_codes::ACCOUNT_NOT_FOUND,
            AccountError::DatabaseError(_) => error_codes::INTERNAL_ERROR,
        };
        Self::new(
            status_of(e.http_status()),
            code,
            format!("{}: {}", e.code(), e),
        )
    }
}
