//! Shadowsocks key material
//!
//! This module turns the `(cipher, secret)` pair of a key configuration into
//! the material the protocol handlers need: the derived AEAD key and a salt
//! generator that marks salts produced by this server.
//!
//! # Supported Methods
//!
//! - **AEAD 2022**: `2022-blake3-aes-256-gcm`, `2022-blake3-aes-128-gcm`,
//!   `2022-blake3-chacha20-poly1305`. The secret is the Base64-encoded key.
//! - **Legacy AEAD**: `aes-256-gcm`, `aes-192-gcm`, `aes-128-gcm`,
//!   `chacha20-ietf-poly1305`.
//!   The secret is a password stretched with `EVP_BytesToKey`.
//!
//! `none` is recognised but rejected: without encryption the endpoint cannot
//! tell users apart.
//!
//! # Example
//!
//! ```
//! use shadowsocks_l4::shadowsocks::{EncryptionKey, ShadowsocksMethod};
//!
//! let key = EncryptionKey::new("aes-256-gcm", "my-password").unwrap();
//! assert_eq!(key.method(), ShadowsocksMethod::Aes256Gcm);
//! assert_eq!(key.len(), 32);
//! ```

mod config;
mod error;
mod key;
mod salt;

pub use config::ShadowsocksMethod;
pub use error::ShadowsocksError;
pub use key::EncryptionKey;
pub use salt::{ServerSaltGenerator, SERVER_SALT_MARK_LEN};
