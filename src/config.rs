//! Application configuration
//!
//! Loaded from `config/{env}.yaml`; `--env` selects the file.

use std::fs;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::transaction::{OrchestratorConfig, SweeperConfig};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub tcc: TccConfig,
    #[serde(default)]
    pub sweeper: SweeperSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Account ledger database (accounts_tb, fund_movements_tb)
    #[serde(default)]
    pub account_db_url: Option<String>,
    /// Transaction database (transactions_tb)
    #[serde(default)]
    pub transaction_db_url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            account_db_url: None,
            transaction_db_url: None,
            max_connections: 20,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TccConfig {
    pub max_retries: u32,
    pub try_timeout_secs: u64,
    pub create_transaction_timeout_secs: u64,
    pub transaction_expiration_minutes: i64,
    pub retry_backoff_ms: u64,
}

impl Default for TccConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            try_timeout_secs: 1,
            create_transaction_timeout_secs: 3,
            transaction_expiration_minutes: 10,
            retry_backoff_ms: 200,
        }
    }
}

impl From<&TccConfig> for OrchestratorConfig {
    fn from(c: &TccConfig) -> Self {
        Self {
            max_retries: c.max_retries,
            try_timeout: Duration::from_secs(c.try_timeout_secs),
            create_timeout: Duration::from_secs(c.create_transaction_timeout_secs),
            expiration: chrono::Duration::minutes(c.transaction_expiration_minutes),
            retry_backoff: Duration::from_millis(c.retry_backoff_ms),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SweeperSettings {
    pub interval_minutes: u64,
    pub page_size: usize,
    /// Run the sweeper inside the API server process
    pub embedded: bool,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 1,
            page_size: 200,
            embedded: true,
        }
    }
}

impl From<&SweeperSettings> for SweeperConfig {
    fn from(s: &SweeperSettings) -> Self {
        Self {
            interval: Duration::from_secs(s.interval_minutes.max(1) * 60),
            page_size: s.page_size.max(1),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.storage.backend == StorageBackend::Postgres {
            anyhow::ensure!(
                self.storage.account_db_url.is_some() && self.storage.transaction_db_url.is_some(),
                "postgres backend requires account_db_url and transaction_db_url"
            );
        }
        anyhow::ensure!(
            self.tcc.try_timeout_secs > 0,
            "tcc.try_timeout_secs must be positive"
        );
        anyhow::ensure!(
            self.tcc.transaction_expiration_minutes > 0,
            "tcc.transaction_expiration_minutes must be positive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: tcc-ledger.log
use_json: false
rotation: daily
gateway:
  host: 0.0.0.0
  port: 8080
"#;

    #[test]
    fn test_defaults_apply() {
        let config = AppConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.tcc.max_retries, 3);
        assert_eq!(config.sweeper.page_size, 200);

        let orchestrator = OrchestratorConfig::from(&config.tcc);
        assert_eq!(orchestrator.try_timeout, Duration::from_secs(1));
        assert_eq!(orchestrator.create_timeout, Duration::from_secs(3));
        assert_eq!(orchestrator.retry_backoff, Duration::from_millis(200));
        assert_eq!(orchestrator.expiration, chrono::Duration::minutes(10));

        let sweeper = SweeperConfig::from(&config.sweeper);
        assert_eq!(sweeper.interval, Duration::from_secs(60));
    }

    #[test]
    fn test_postgres_requires_urls() {
        let yaml = format!("{}storage:\n  backend: postgres\n  max_connections: 5\n  run_migrations: true\n", MINIMAL);
        assert!(AppConfig::from_yaml_str(&yaml).is_err());

        let yaml = format!(
            "{}storage:\n  backend: postgres\n  account_db_url: postgres://a\n  transaction_db_url: postgres://t\n  max_connections: 5\n  run_migrations: false\n",
            MINIMAL
        );
        let config = AppConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(!config.storage.run_migrations);
    }

    #[test]
    fn test_bundled_configs_parse() {
        for env in ["dev", "postgres"] {
            let path = format!("{}/config/{}.yaml", env!("CARGO_MANIFEST_DIR"), env);
            let content = fs::read_to_string(&path).unwrap();
            AppConfig::from_yaml_str(&content).unwrap();
        }
    }
}
