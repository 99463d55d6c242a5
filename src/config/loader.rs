//! Configuration loading
//!
//! Loads configuration from JSON files, strings and environment variables.

use std::path::Path;

use tracing::{debug, info};

use super::types::Config;
use crate::error::ConfigError;

/// Environment variable overriding `log.level`
pub const ENV_LOG_LEVEL: &str = "SS_L4_LOG_LEVEL";

/// Environment variable overriding `log.format`
pub const ENV_LOG_FORMAT: &str = "SS_L4_LOG_FORMAT";

/// Load configuration from a JSON file
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed or validated.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    debug!("Loading configuration from {:?}", path);

    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| {
        ConfigError::ParseError(format!("Failed to parse JSON: {e} at {path:?}"))
    })?;

    config.validate()?;

    info!(keys = config.shadowsocks.keys.len(), "Configuration loaded");

    Ok(config)
}

/// Load configuration from a JSON string
///
/// # Errors
///
/// Returns `ConfigError` if parsing or validation fails.
pub fn load_config_str(json: &str) -> Result<Config, ConfigError> {
    let config: Config =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.validate()?;

    Ok(config)
}

/// Load configuration with environment variable overrides
///
/// Environment variables:
/// - `SS_L4_LOG_LEVEL`: Override log level
/// - `SS_L4_LOG_FORMAT`: Override log format
///
/// # Errors
///
/// Returns `ConfigError` if loading, parsing or re-validation fails.
pub fn load_config_with_env(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let mut config = load_config(path)?;

    if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
        config.log.level = level;
        debug!("Log level overridden to {}", config.log.level);
    }

    if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
        config.log.format = format;
        debug!("Log format overridden to {}", config.log.format);
    }

    config.validate().map_err(|e| ConfigError::EnvError {
        name: format!("{ENV_LOG_LEVEL}/{ENV_LOG_FORMAT}"),
        reason: e.to_string(),
    })?;

    Ok(config)
}

/// Write a sample configuration file to the given path
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be written.
pub fn create_default_config(path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let config = Config::default_config();
    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| ConfigError::ParseError(format!("Failed to serialize config: {e}")))?;

    std::fs::write(path, json)?;
    Ok(())
}
