//! Account handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};
use crate::account::{AccountView, CreateAccountRequest};
use crate::core_types::AccountId;

/// Create an account with an initial balance
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Account created", body = AccountView, content_type = "application/json"),
        (status = 400, description = "Invalid account id or balance"),
        (status = 409, description = "Account already exists")
    ),
    tag = "Account"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<AccountView> {
    let view = state.accounts.create_account(req).await?;
    ok(view)
}

/// Query an account balance
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{account_id}",
    params(("account_id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account found", body = AccountView, content_type = "application/json"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<AccountId>,
) -> ApiResult<AccountView> {
    let view = state.accounts.query_account(account_id).await?;
    ok(view)
}
