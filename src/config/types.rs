//! Configuration types
//!
//! All types are serde-deserializable from the JSON configuration file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Shadowsocks handler configuration
    #[serde(default)]
    pub shadowsocks: ShadowsocksHandlerConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Validate the configuration
    ///
    /// Key material is validated later, when the cipher registry is built.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log.validate()
    }

    /// Create a sample configuration with one placeholder key
    #[must_use]
    pub fn default_config() -> Self {
        Self {
            shadowsocks: ShadowsocksHandlerConfig {
                keys: vec![KeyConfig::new(
                    "user-0",
                    "chacha20-ietf-poly1305",
                    "change-me",
                )],
            },
            log: LogConfig::default(),
        }
    }
}

/// Configuration of the Shadowsocks layer-4 handler
///
/// This is the configuration schema the handler module declares to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShadowsocksHandlerConfig {
    /// Access keys, in priority order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<KeyConfig>,
}

impl ShadowsocksHandlerConfig {
    /// Create a handler configuration from a key list
    #[must_use]
    pub fn new(keys: Vec<KeyConfig>) -> Self {
        Self { keys }
    }
}

/// One user's access key
///
/// `id` is informational and need not be unique; keys are told apart by
/// their `(cipher, secret)` pair.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeyConfig {
    /// Key identifier reported in logs and metrics
    pub id: String,

    /// Cipher name, e.g. `chacha20-ietf-poly1305`
    pub cipher: String,

    /// Password (legacy AEAD) or Base64 key (AEAD 2022)
    pub secret: String,
}

impl KeyConfig {
    /// Create a new key configuration
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        cipher: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            cipher: cipher.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("id", &self.id)
            .field("cipher", &self.cipher)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Include target (module path)
    #[serde(default = "default_true")]
    pub target: bool,
}

impl LogConfig {
    /// Validate log settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for an unknown level or format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )))
            }
        }

        match self.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid log format: {other} (expected json or text)"
            ))),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: true,
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_true() -> bool {
    true
}
