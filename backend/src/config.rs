//! Configuration management for the pharmacy stock service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PHARMA_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::ClassifierDefaults;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration, used by the Postgres store
    pub database: DatabaseConfig,

    /// JWT verification configuration
    pub jwt: JwtConfig,

    /// External store selection
    pub store: StoreConfig,

    /// Stock classification settings
    pub stock: StockConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret shared with the authentication provider
    pub secret: String,
}

/// Which external store backs the snapshot loader
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Rest,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// Base URL of the backend-as-a-service project (REST store only)
    pub rest_url: String,

    /// Project API key sent as `apikey` (REST store only)
    pub api_key: String,

    /// Per-request timeout of the REST client
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StockConfig {
    /// Trailing window of movements used for rotation
    pub rotation_window_days: i64,

    /// Lower bound for products without "stock_limite"
    pub default_lower_bound: i64,

    /// Upper bound for products without "stock_alerte"
    pub default_upper_bound: i64,
}

impl StockConfig {
    pub fn classifier_defaults(&self) -> ClassifierDefaults {
        ClassifierDefaults {
            lower_bound: self.default_lower_bound.max(0),
            upper_bound: self.default_upper_bound.max(0),
        }
    }
}

impl Default for StockConfig {
    fn default() -> Self {
        let defaults = ClassifierDefaults::default();
        Self {
            rotation_window_days: shared::ROTATION_WINDOW_DAYS,
            default_lower_bound: defaults.lower_bound,
            default_upper_bound: defaults.upper_bound,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("PHARMA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost/pharmacy")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("store.kind", "postgres")?
            .set_default("store.rest_url", "")?
            .set_default("store.api_key", "")?
            .set_default("store.request_timeout_secs", 15)?
            .set_default("stock.rotation_window_days", shared::ROTATION_WINDOW_DAYS)?
            .set_default("stock.default_lower_bound", shared::DEFAULT_LOWER_BOUND)?
            .set_default("stock.default_upper_bound", shared::DEFAULT_UPPER_BOUND)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PHARMA_ prefix)
            .add_source(
                Environment::with_prefix("PHARMA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
