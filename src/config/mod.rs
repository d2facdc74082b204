//! Configuration management for culture-ledger
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use culture_ledger::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Caching cultures from: {}", config.remote.base_url);
//! ```
//!
//! # Environment Variables
//!
//! Any value can be overridden with `CULTURE_LEDGER__<section>__<key>`:
//! - `CULTURE_LEDGER__REMOTE__BASE_URL=https://cultures.example.com`
//! - `CULTURE_LEDGER__STORE__BACKEND=memory`
//! - `CULTURE_LEDGER__CODEC__MAX_RECORD_BYTES=16MB`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/culture-ledger.toml`.
//! This can be overridden using the `CULTURE_LEDGER_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    CodecConfig, Config, RemoteConfig, StoreBackend, StoreConfig, TelemetryConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
