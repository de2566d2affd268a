//! Transaction handlers
//!
//! Create and retry answer with whatever snapshot the orchestrator reached
//! before its deadline; a PROCESSING answer carries `in_flight_reason`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, TransactionApiData, ok};
use crate::core_types::TransactionId;
use crate::transaction::{CreateTransactionRequest, RetryTransactionRequest, TransactionError};

fn parse_transaction_id(raw: &str) -> Result<TransactionId, ApiError> {
    raw.parse::<TransactionId>()
        .map_err(|_| TransactionError::InvalidTransactionId(raw.to_string()).into())
}

/// Create and drive a transfer
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 200, description = "Transaction snapshot", body = TransactionApiData, content_type = "application/json"),
        (status = 400, description = "Validation failure or insufficient balance"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Transaction"
)]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTransactionRequest>,
) -> ApiResult<TransactionApiData> {
    let outcome = state.transactions.create_transaction(req).await?;
    ok(TransactionApiData::from(&outcome))
}

/// Query a transaction
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{transaction_id}",
    params(("transaction_id" = String, Path, description = "Transaction ULID")),
    responses(
        (status = 200, description = "Transaction snapshot", body = TransactionApiData, content_type = "application/json"),
        (status = 400, description = "Malformed transaction id"),
        (status = 404, description = "Transaction not found")
    ),
    tag = "Transaction"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> ApiResult<TransactionApiData> {
    let id = parse_transaction_id(&transaction_id)?;
    let txn = state.transactions.query_transaction(&id).await?;
    ok(TransactionApiData::from(&txn))
}

/// Re-drive a non-terminal transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions/retry",
    request_body = RetryTransactionRequest,
    responses(
        (status = 200, description = "Transaction snapshot", body = TransactionApiData, content_type = "application/json"),
        (status = 400, description = "Malformed transaction id"),
        (status = 404, description = "Transaction not found")
    ),
    tag = "Transaction"
)]
pub async fn retry_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetryTransactionRequest>,
) -> ApiResult<TransactionApiData> {
    let id = parse_transaction_id(&req.transaction_id)?;
    let outcome = state.transactions.retry_transaction(&id).await?;
    ok(TransactionApiData::from(&outcome))
}
