//! Cipher registry
//!
//! Builds the deduplicated, validated list of access keys a Shadowsocks
//! endpoint accepts.
//!
//! # Build Rules
//!
//! 1. Keys are processed in configuration order.
//! 2. A key whose `(cipher, secret)` was already seen is skipped; the first
//!    occurrence wins, whatever the ids.
//! 3. A key whose cipher or secret cannot produce an encryption key fails
//!    the whole build.
//! 4. No keys at all is allowed, with a warning.
//!
//! # Example
//!
//! ```
//! use shadowsocks_l4::cipher::CipherRegistry;
//! use shadowsocks_l4::config::KeyConfig;
//!
//! let registry = CipherRegistry::build(&[
//!     KeyConfig::new("a", "aes-256-gcm", "s1"),
//!     KeyConfig::new("b", "aes-256-gcm", "s1"),
//!     KeyConfig::new("c", "aes-256-gcm", "s2"),
//! ])
//! .unwrap();
//!
//! assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["a", "c"]);
//! ```

mod entry;
mod registry;

pub use entry::{CipherEntry, CipherIdentity};
pub use registry::CipherRegistry;
