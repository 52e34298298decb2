use anyhow::{Context, Result};
use compute::{default_service, ReconciliationStrategy};
use config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use std::time::Duration;

use crate::helpers::cache::ReceiptCache;
use crate::schemas::AppState;

const DEFAULT_DATABASE_URL: &str = "sqlite://condofin.db?mode=rwc";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Runtime configuration.
///
/// Sources in increasing priority: built-in defaults, `condofin.toml`,
/// `CONDOFIN__*` environment variables, command line flags.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub reconciliation_strategy: ReconciliationStrategy,
    /// Time to live of cached receipt reads
    pub cache_ttl_seconds: u64,
    pub cache_capacity: u64,
    pub request_timeout_seconds: u64,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub bind_address: Option<String>,
    pub reconciliation_strategy: Option<ReconciliationStrategy>,
}

impl AppConfig {
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_sources(Some("condofin"), overrides)
    }

    fn from_sources(file: Option<&str>, overrides: ConfigOverrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("reconciliation_strategy", ReconciliationStrategy::default().as_str())?
            .set_default("cache_ttl_seconds", 300_u64)?
            .set_default("cache_capacity", 1000_u64)?
            .set_default("request_timeout_seconds", 30_u64)?;

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix("CONDOFIN").separator("__"))
            .set_override_option("database_url", overrides.database_url)?
            .set_override_option("bind_address", overrides.bind_address)?
            .set_override_option(
                "reconciliation_strategy",
                overrides.reconciliation_strategy.map(|s| s.as_str()),
            )?
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}

/// Initialize application state from configuration
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", config.database_url))?;

    let cache = ReceiptCache::new(config.cache_capacity, Duration::from_secs(config.cache_ttl_seconds));

    Ok(AppState {
        db,
        cache,
        payments: default_service(Some(config.reconciliation_strategy)),
        request_timeout: Duration::from_secs(config.request_timeout_seconds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_sources(None, ConfigOverrides::default()).unwrap();

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.reconciliation_strategy, ReconciliationStrategy::Incremental);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.request_timeout_seconds, 30);
    }

    #[test]
    fn test_overrides_win() {
        let config = AppConfig::from_sources(
            None,
            ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                bind_address: Some("127.0.0.1:9000".to_string()),
                reconciliation_strategy: Some(ReconciliationStrategy::Ledger),
            },
        )
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.reconciliation_strategy, ReconciliationStrategy::Ledger);
    }

    #[tokio::test]
    async fn test_initialize_app_state() {
        let config = AppConfig::from_sources(
            None,
            ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let state = initialize_app_state(&config).await.unwrap();

        assert_eq!(state.payments.strategy_name(), "incremental");
        assert_eq!(state.request_timeout, Duration::from_secs(30));
    }
}
