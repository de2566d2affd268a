//! Standalone expiry sweeper
//!
//! Force-cancels expired PENDING/PROCESSING transactions against the
//! PostgreSQL stores. Run alongside API servers that set
//! `sweeper.embedded: false`.
//!
//! Usage:
//!   cargo run --bin invalidator -- --env postgres
//!   cargo run --bin invalidator -- --env postgres --once

use anyhow::bail;
use chrono::Utc;
use tcc_ledger::bootstrap::Services;
use tcc_ledger::config::{AppConfig, StorageBackend};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "postgres".to_string()
}

fn run_once() -> bool {
    std::env::args().any(|a| a == "--once")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = tcc_ledger::logging::init_logging(&app_config);

    if app_config.storage.backend != StorageBackend::Postgres {
        bail!("invalidator needs the postgres backend; memory stores are process-local");
    }

    let services = Services::build(&app_config).await?;
    let sweeper = services.sweeper(&app_config);

    if run_once() {
        let report = sweeper.sweep_once(Utc::now()).await?;
        tracing::info!(
            scanned = report.scanned,
            failed = report.failed,
            fulfilled = report.fulfilled,
            deferred = report.deferred,
            overloaded = report.overloaded,
            "Single sweep finished"
        );
        return Ok(());
    }

    tracing::info!(env = %env, "Invalidator started");
    sweeper.run().await
}
