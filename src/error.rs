//! Error types for shadowsocks-l4
//!
//! Errors fall in two scopes. Provisioning errors ([`ConfigError`]) stop a
//! handler instance from ever serving traffic. Dispatch errors
//! ([`DispatchError`]) belong to a single connection and never affect others.

use std::io;

use thiserror::Error;

use crate::shadowsocks::ShadowsocksError;

/// Error returned by a bound stream or association handler
///
/// Opaque to this crate; the dispatcher hands it back untouched.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provisioning errors (configuration, key derivation)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-connection dispatch errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

impl Error {
    /// Check if the handler instance can keep serving after this error
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(e) => e.is_recoverable(),
            Self::Dispatch(e) => e.is_recoverable(),
        }
    }
}

/// Configuration and provisioning errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found or inaccessible
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Validation error (invalid values, missing required fields)
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Environment variable error
    #[error("Environment variable error: {name}: {reason}")]
    EnvError { name: String, reason: String },

    /// A key's cipher and secret could not produce an encryption key
    #[error("failed to create encryption key for key {id}: {source}")]
    InvalidKey {
        id: String,
        #[source]
        source: ShadowsocksError,
    },

    /// No module registered under this identifier
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    /// I/O error while reading config
    #[error("I/O error reading configuration: {0}")]
    IoError(#[from] io::Error),
}

impl ConfigError {
    /// Create an invalid key error
    pub fn invalid_key(id: impl Into<String>, source: ShadowsocksError) -> Self {
        Self::InvalidKey {
            id: id.into(),
            source,
        }
    }

    /// Config errors are not recoverable without operator intervention
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        false
    }
}

/// Per-connection dispatch errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The connection carries no classification tag
    ///
    /// Usually means the handler was routed to directly instead of through
    /// the classifier that tags connections as stream or packet.
    #[error("unknown outline connection type")]
    UnknownConnectionType,

    /// Error raised by the bound stream or association handler
    #[error(transparent)]
    Handler(HandlerError),
}

impl DispatchError {
    /// Create a handler error from any error type
    pub fn handler(err: impl Into<HandlerError>) -> Self {
        Self::Handler(err.into())
    }

    /// Dispatch errors are scoped to one connection; the handler keeps serving
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        true
    }

    /// Check if this error came from the bound handler
    #[must_use]
    pub const fn is_handler_failure(&self) -> bool {
        matches!(self, Self::Handler(_))
    }
}
