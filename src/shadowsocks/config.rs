//! Shadowsocks cipher methods
//!
//! Names, key sizes and classification of the ciphers a key configuration
//! may select.

use serde::{Deserialize, Serialize};

#[cfg(feature = "shadowsocks")]
use shadowsocks::crypto::CipherKind;

use super::error::ShadowsocksError;

/// Shadowsocks encryption method
///
/// Supports AEAD 2022 and legacy AEAD v1 ciphers. Key configurations name
/// the method as a string; [`ShadowsocksMethod::parse_method`] maps it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadowsocksMethod {
    // AEAD 2022
    /// 2022-blake3-aes-256-gcm
    #[serde(rename = "2022-blake3-aes-256-gcm")]
    Aead2022Blake3Aes256Gcm,

    /// 2022-blake3-aes-128-gcm
    #[serde(rename = "2022-blake3-aes-128-gcm")]
    Aead2022Blake3Aes128Gcm,

    /// 2022-blake3-chacha20-poly1305
    #[serde(rename = "2022-blake3-chacha20-poly1305")]
    Aead2022Blake3Chacha20Poly1305,

    // AEAD v1
    /// aes-256-gcm
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,

    /// aes-192-gcm
    #[serde(rename = "aes-192-gcm")]
    Aes192Gcm,

    /// aes-128-gcm
    #[serde(rename = "aes-128-gcm")]
    Aes128Gcm,

    /// chacha20-ietf-poly1305
    #[serde(rename = "chacha20-ietf-poly1305")]
    Chacha20IetfPoly1305,

    /// No encryption. Parsed so it can be rejected with a clear error.
    #[serde(rename = "none")]
    None,
}

impl ShadowsocksMethod {
    /// Convert to shadowsocks `CipherKind`
    ///
    /// # Errors
    ///
    /// Returns `ShadowsocksError::UnsupportedMethod` for `aes-192-gcm`, which
    /// the shadowsocks crate does not implement.
    #[cfg(feature = "shadowsocks")]
    pub fn to_cipher_kind(self) -> Result<CipherKind, ShadowsocksError> {
        match self {
            Self::Aead2022Blake3Aes256Gcm => Ok(CipherKind::AEAD2022_BLAKE3_AES_256_GCM),
            Self::Aead2022Blake3Aes128Gcm => Ok(CipherKind::AEAD2022_BLAKE3_AES_128_GCM),
            Self::Aead2022Blake3Chacha20Poly1305 => {
                Ok(CipherKind::AEAD2022_BLAKE3_CHACHA20_POLY1305)
            }
            Self::Aes256Gcm => Ok(CipherKind::AES_256_GCM),
            Self::Aes192Gcm => Err(ShadowsocksError::UnsupportedMethod(self.to_string())),
            Self::Aes128Gcm => Ok(CipherKind::AES_128_GCM),
            Self::Chacha20IetfPoly1305 => Ok(CipherKind::CHACHA20_POLY1305),
            Self::None => Ok(CipherKind::NONE),
        }
    }

    /// Get the method name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aead2022Blake3Aes256Gcm => "2022-blake3-aes-256-gcm",
            Self::Aead2022Blake3Aes128Gcm => "2022-blake3-aes-128-gcm",
            Self::Aead2022Blake3Chacha20Poly1305 => "2022-blake3-chacha20-poly1305",
            Self::Aes256Gcm => "aes-256-gcm",
            Self::Aes192Gcm => "aes-192-gcm",
            Self::Aes128Gcm => "aes-128-gcm",
            Self::Chacha20IetfPoly1305 => "chacha20-ietf-poly1305",
            Self::None => "none",
        }
    }

    /// Key length in bytes
    #[must_use]
    pub const fn key_len(&self) -> usize {
        match self {
            Self::Aead2022Blake3Aes128Gcm | Self::Aes128Gcm => 16,
            Self::Aes192Gcm => 24,
            Self::Aead2022Blake3Aes256Gcm
            | Self::Aead2022Blake3Chacha20Poly1305
            | Self::Aes256Gcm
            | Self::Chacha20IetfPoly1305 => 32,
            Self::None => 0,
        }
    }

    /// Salt length in bytes, equal to the key length for every AEAD method
    #[must_use]
    pub const fn salt_len(&self) -> usize {
        self.key_len()
    }

    /// Check if this is an AEAD 2022 cipher
    #[must_use]
    pub const fn is_aead_2022(&self) -> bool {
        matches!(
            self,
            Self::Aead2022Blake3Aes256Gcm
                | Self::Aead2022Blake3Aes128Gcm
                | Self::Aead2022Blake3Chacha20Poly1305
        )
    }

    /// Check if this cipher provides encryption (not "none")
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Parse method from string
    ///
    /// # Errors
    ///
    /// Returns an error if the method string is not recognized.
    pub fn parse_method(s: &str) -> Result<Self, ShadowsocksError> {
        match s.to_lowercase().as_str() {
            "2022-blake3-aes-256-gcm" => Ok(Self::Aead2022Blake3Aes256Gcm),
            "2022-blake3-aes-128-gcm" => Ok(Self::Aead2022Blake3Aes128Gcm),
            "2022-blake3-chacha20-poly1305" => Ok(Self::Aead2022Blake3Chacha20Poly1305),
            "aes-256-gcm" => Ok(Self::Aes256Gcm),
            "aes-192-gcm" => Ok(Self::Aes192Gcm),
            "aes-128-gcm" => Ok(Self::Aes128Gcm),
            "chacha20-ietf-poly1305" => Ok(Self::Chacha20IetfPoly1305),
            "none" => Ok(Self::None),
            _ => Err(ShadowsocksError::InvalidMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for ShadowsocksMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShadowsocksMethod {
    type Err = ShadowsocksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_method(s)
    }
}
