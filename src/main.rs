//! TCC Ledger API server
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌────────────┐    ┌──────────────┐
//! │ Gateway  │───▶│ Orchestrator │───▶│ TCC Engine │───▶│ Account DB   │
//! │  (axum)  │    │              │    └────────────┘    └──────────────┘
//! └──────────┘    │              │───────────────────▶ ┌──────────────┐
//!                 └──────────────┘                     │ Transaction  │
//!                   ▲ Sweeper (embedded or invalidator) │ DB           │
//!                                                      └──────────────┘
//! ```
//!
//! Usage: `tcc_ledger [--env dev] [--port 8080]`

use std::sync::Arc;

use anyhow::bail;
use tcc_ledger::bootstrap::Services;
use tcc_ledger::config::{AppConfig, StorageBackend};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = tcc_ledger::logging::init_logging(&app_config);

    tracing::info!(env = %env, backend = ?app_config.storage.backend, "Starting TCC Ledger");

    // Nothing outside this process can see in-memory rows
    if app_config.storage.backend == StorageBackend::Memory && !app_config.sweeper.embedded {
        bail!("memory backend requires sweeper.embedded = true");
    }

    let services = Services::build(&app_config).await?;

    if app_config.sweeper.embedded {
        let sweeper = services.sweeper(&app_config);
        tokio::spawn(async move {
            sweeper.run().await;
        });
        tracing::info!(
            interval_minutes = app_config.sweeper.interval_minutes,
            page_size = app_config.sweeper.page_size,
            "Embedded expiry sweeper started"
        );
    }

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    let state = Arc::new(services.app_state());
    tcc_ledger::gateway::run_server(&app_config.gateway.host, port, state).await
}
