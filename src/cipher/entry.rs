//! Cipher entries and their identity

use std::fmt;

#[cfg(feature = "shadowsocks")]
use std::net::SocketAddr;

#[cfg(feature = "shadowsocks")]
use shadowsocks::{config::ServerConfig, ServerAddr};

use crate::config::KeyConfig;
use crate::shadowsocks::{EncryptionKey, ServerSaltGenerator, ShadowsocksMethod};

#[cfg(feature = "shadowsocks")]
use crate::error::ConfigError;

/// The credential a key is deduplicated on: the raw `(cipher, secret)` pair
///
/// Two key configurations with the same identity are the same credential,
/// whatever their ids.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CipherIdentity {
    cipher: String,
    secret: String,
}

impl CipherIdentity {
    /// Create an identity from a cipher name and secret
    pub fn new(cipher: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            cipher: cipher.into(),
            secret: secret.into(),
        }
    }

    /// Cipher name as configured
    #[must_use]
    pub fn cipher(&self) -> &str {
        &self.cipher
    }
}

impl From<&KeyConfig> for CipherIdentity {
    fn from(config: &KeyConfig) -> Self {
        Self::new(config.cipher.as_str(), config.secret.as_str())
    }
}

impl fmt::Debug for CipherIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherIdentity")
            .field("cipher", &self.cipher)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A validated, usable access key
///
/// Immutable once built. Holds the derived key material, the secret it came
/// from, and the salt generator keyed from that secret.
#[derive(Clone)]
pub struct CipherEntry {
    id: String,
    key: EncryptionKey,
    secret: String,
    salt_generator: ServerSaltGenerator,
}

impl CipherEntry {
    /// Create an entry from derived key material
    pub fn new(id: impl Into<String>, key: EncryptionKey, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        let salt_generator = ServerSaltGenerator::new(&secret);
        Self {
            id: id.into(),
            key,
            secret,
            salt_generator,
        }
    }

    /// Key identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Derived key material
    #[must_use]
    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    /// Cipher method
    #[must_use]
    pub fn method(&self) -> ShadowsocksMethod {
        self.key.method()
    }

    /// Secret the key was derived from
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Salt generator for salts sent by this server under this key
    #[must_use]
    pub fn salt_generator(&self) -> &ServerSaltGenerator {
        &self.salt_generator
    }

    /// Build a shadowsocks crate `ServerConfig` for this key
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKey` if the shadowsocks crate has no
    /// implementation of the method, or `ConfigError::ValidationError` if it
    /// rejects the method/secret pair.
    #[cfg(feature = "shadowsocks")]
    pub fn to_server_config(&self, addr: SocketAddr) -> Result<ServerConfig, ConfigError> {
        let kind = self
            .method()
            .to_cipher_kind()
            .map_err(|e| ConfigError::invalid_key(self.id.as_str(), e))?;

        ServerConfig::new(ServerAddr::SocketAddr(addr), self.secret.clone(), kind)
        .map_err(|e| {
            ConfigError::ValidationError(format!(
                "failed to create server config for key {}: {}",
                self.id, e
            ))
        })
    }
}

impl fmt::Debug for CipherEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherEntry")
            .field("id", &self.id)
            .field("method", &self.method())
            .finish_non_exhaustive()
    }
}
