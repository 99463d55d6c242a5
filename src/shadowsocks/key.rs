//! Encryption key derivation
//!
//! Legacy AEAD methods stretch a plaintext password with `EVP_BytesToKey`
//! (MD5). AEAD 2022 methods take the key directly as Base64.

use std::fmt;

use base64::Engine;
use md5::{Digest, Md5};

use super::config::ShadowsocksMethod;
use super::error::ShadowsocksError;

/// Key material derived from a cipher name and secret
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    method: ShadowsocksMethod,
    key: Vec<u8>,
}

impl EncryptionKey {
    /// Derive a key for `cipher` from `secret`
    ///
    /// # Errors
    ///
    /// Returns `ShadowsocksError` if:
    /// - `cipher` is not a known method, or is `none`
    /// - `secret` is empty
    /// - an AEAD 2022 secret is not Base64 or has the wrong length
    pub fn new(cipher: &str, secret: &str) -> Result<Self, ShadowsocksError> {
        let method = ShadowsocksMethod::parse_method(cipher)?;
        Self::from_method(method, secret)
    }

    /// Derive a key for an already parsed method
    ///
    /// # Errors
    ///
    /// See [`EncryptionKey::new`].
    pub fn from_method(method: ShadowsocksMethod, secret: &str) -> Result<Self, ShadowsocksError> {
        if !method.is_encrypted() {
            return Err(ShadowsocksError::UnsupportedMethod(method.to_string()));
        }

        if secret.is_empty() {
            return Err(ShadowsocksError::InvalidPassword(
                "password cannot be empty".into(),
            ));
        }

        let key = if method.is_aead_2022() {
            decode_2022_key(method, secret)?
        } else {
            bytes_to_key(secret.as_bytes(), method.key_len())
        };

        Ok(Self { method, key })
    }

    /// Cipher method this key belongs to
    #[must_use]
    pub fn method(&self) -> ShadowsocksMethod {
        self.method
    }

    /// Raw key bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Key length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.key.len()
    }

    /// Always false for a successfully derived key
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("method", &self.method)
            .field("key", &"<redacted>")
            .finish()
    }
}

fn decode_2022_key(method: ShadowsocksMethod, secret: &str) -> Result<Vec<u8>, ShadowsocksError> {
    let key = base64::engine::general_purpose::STANDARD
        .decode(secret)
        .map_err(|e| {
            ShadowsocksError::InvalidPassword(format!(
                "{method} requires a Base64-encoded key: {e}"
            ))
        })?;

    if key.len() != method.key_len() {
        return Err(ShadowsocksError::InvalidKeyLength {
            method: method.to_string(),
            expected: method.key_len(),
            actual: key.len(),
        });
    }

    Ok(key)
}

/// OpenSSL `EVP_BytesToKey` with MD5 and no salt, one iteration
///
/// `D_0 = MD5(password)`, `D_i = MD5(D_{i-1} || password)`, truncated to `key_len`.
fn bytes_to_key(password: &[u8], key_len: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(key_len + 16);
    let mut last: Option<[u8; 16]> = None;

    while key.len() < key_len {
        let mut hasher = Md5::new();
        if let Some(prev) = last {
            hasher.update(prev);
        }
        hasher.update(password);
        let mut digest = [0u8; 16];
        digest.copy_from_slice(&hasher.finalize());
        key.extend_from_slice(&digest);
        last = Some(digest);
    }

    key.truncate(key_len);
    key
}
