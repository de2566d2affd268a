//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::account::{AccountView, CreateAccountRequest};
use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::TransactionApiData;
use crate::transaction::{CreateTransactionRequest, RetryTransactionRequest};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TCC Ledger API",
        version = "0.1.0",
        description = "Account ledger with Try-Confirm-Cancel transfers between two independent stores.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::account::create_account,
        crate::gateway::handlers::account::get_account,
        crate::gateway::handlers::transaction::create_transaction,
        crate::gateway::handlers::transaction::get_transaction,
        crate::gateway::handlers::transaction::retry_transaction,
    ),
    components(
        schemas(
            HealthResponse,
            CreateAccountRequest,
            AccountView,
            CreateTransactionRequest,
            RetryTransactionRequest,
            TransactionApiData,
        )
    ),
    tags(
        (name = "Account", description = "Account creation and balance queries"),
        (name = "Transaction", description = "TCC transfers between accounts"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
