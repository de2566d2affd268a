//! HTTP Gateway
//!
//! axum router under `/api/v1` with the unified `{code, msg, data}`
//! envelope, request tracing, and Swagger UI at `/docs`.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use state::AppState;

/// Build the full router; split out of [`run_server`] for tests
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/accounts", post(handlers::create_account))
        .route("/accounts/{account_id}", get(handlers::get_account))
        .route("/transactions", post(handlers::create_transaction))
        .route("/transactions/retry", post(handlers::retry_transaction))
        .route(
            "/transactions/{transaction_id}",
            get(handlers::get_transaction),
        );

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

/// Start HTTP Gateway server; returns only on bind or serve failure
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port already in use?)", addr))?;

    tracing::info!(addr = %addr, "Gateway listening");
    tracing::info!("API docs at http://{}/docs", addr);

    axum::serve(listener, router(state))
        .await
        .context("Gateway server error")
}
