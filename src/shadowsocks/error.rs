//! Shadowsocks error types
//!
//! Errors raised while turning a configured cipher name and secret into
//! usable key material.

use std::fmt;

/// Shadowsocks key derivation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowsocksError {
    /// Cipher name is not a known Shadowsocks method
    InvalidMethod(String),

    /// Cipher is known but cannot be used for a multi-user endpoint
    UnsupportedMethod(String),

    /// Invalid or missing secret
    InvalidPassword(String),

    /// AEAD 2022 key decoded to the wrong number of bytes
    InvalidKeyLength {
        /// Method the key was configured for
        method: String,
        /// Required key length in bytes
        expected: usize,
        /// Decoded key length in bytes
        actual: usize,
    },

    /// Salt buffer too short to carry the server mark
    SaltTooShort(usize),
}

impl fmt::Display for ShadowsocksError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMethod(method) => {
                write!(f, "invalid Shadowsocks encryption method: {method}")
            }
            Self::UnsupportedMethod(method) => {
                write!(f, "unsupported Shadowsocks encryption method: {method}")
            }
            Self::InvalidPassword(reason) => {
                write!(f, "invalid Shadowsocks password: {reason}")
            }
            Self::InvalidKeyLength {
                method,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{method} requires a {expected}-byte key (got {actual} bytes)"
                )
            }
            Self::SaltTooShort(len) => {
                write!(f, "salt of {len} bytes is too short for the server mark")
            }
        }
    }
}

impl std::error::Error for ShadowsocksError {}
