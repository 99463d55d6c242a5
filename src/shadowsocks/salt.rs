//! Server salt marking
//!
//! Salts produced by this server end in a short HMAC mark keyed from the
//! user's secret, so a salt replayed back at the server can be recognised
//! as one of its own.
//!
//! ```text
//! +---------------------------+-----------------+
//! | random prefix             | HMAC mark (4 B) |
//! +---------------------------+-----------------+
//! ```

use std::fmt;

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::error::ShadowsocksError;

/// HKDF info string for the salt marking key
const SERVER_SALT_LABEL: &[u8] = b"outline-server-salt";

/// Length of the HMAC mark at the end of a server salt
pub const SERVER_SALT_MARK_LEN: usize = 4;

const SALT_KEY_LEN: usize = 32;

/// Generates and recognises server-marked salts for one secret
#[derive(Clone)]
pub struct ServerSaltGenerator {
    key: [u8; SALT_KEY_LEN],
}

impl ServerSaltGenerator {
    /// Derive the marking key from `secret`
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let hk = Hkdf::<Sha256>::new(None, secret.as_bytes());
        let mut key = [0u8; SALT_KEY_LEN];
        hk.expand(SERVER_SALT_LABEL, &mut key)
            .expect("32 bytes is a valid HKDF-SHA256 output length");
        Self { key }
    }

    /// Fill `salt` with a random prefix followed by the server mark
    ///
    /// # Errors
    ///
    /// Returns `ShadowsocksError::SaltTooShort` if `salt` cannot hold the mark.
    pub fn fill_salt(&self, salt: &mut [u8]) -> Result<(), ShadowsocksError> {
        if salt.len() < SERVER_SALT_MARK_LEN {
            return Err(ShadowsocksError::SaltTooShort(salt.len()));
        }

        let (prefix, mark) = salt.split_at_mut(salt.len() - SERVER_SALT_MARK_LEN);
        rand::thread_rng().fill_bytes(prefix);
        let tag = self.tag(prefix);
        mark.copy_from_slice(&tag[..SERVER_SALT_MARK_LEN]);
        Ok(())
    }

    /// Check whether `salt` carries this generator's mark
    #[must_use]
    pub fn is_server_salt(&self, salt: &[u8]) -> bool {
        if salt.len() < SERVER_SALT_MARK_LEN {
            return false;
        }

        let (prefix, mark) = salt.split_at(salt.len() - SERVER_SALT_MARK_LEN);
        let tag = self.tag(prefix);
        tag[..SERVER_SALT_MARK_LEN].ct_eq(mark).into()
    }

    fn tag(&self, prefix: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .expect("HMAC can take key of any size");
        mac.update(prefix);
        mac.finalize().into_bytes().to_vec()
    }
}

impl fmt::Debug for ServerSaltGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSaltGenerator").finish_non_exhaustive()
    }
}
