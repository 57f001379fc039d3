//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CHARLABOT_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use charlabot_entitlements::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod database;
mod error;
mod paypal;
mod server;
mod storage;
mod trial;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use paypal::PayPalConfig;
pub use server::{Environment, ServerConfig};
pub use storage::{StorageBackend, StorageConfig};
pub use trial::TrialConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the entitlement service.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend selection (file vs. postgres, analytics log)
    #[serde(default)]
    pub storage: StorageConfig,

    /// Database configuration (postgres backend only)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// PayPal configuration (subscription verification)
    #[serde(default)]
    pub paypal: PayPalConfig,

    /// Trial policy (durations, organization codes)
    #[serde(default)]
    pub trial: TrialConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CHARLABOT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CHARLABOT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CHARLABOT__STORAGE__BACKEND=postgres` -> `storage.backend = postgres`
    /// - `CHARLABOT__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHARLABOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// The database section is only validated when the postgres backend
    /// is selected; the file backend needs no connection URL.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.storage.validate()?;
        if self.storage.backend == StorageBackend::Postgres {
            self.database.validate()?;
        }
        self.paypal.validate()?;
        self.trial.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
