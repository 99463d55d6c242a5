//! Cipher registry construction
//!
//! The registry is built once from the configured keys and is read-only
//! afterwards. Building is all-or-nothing: a single key that fails to derive
//! aborts the build and no registry is produced.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::entry::{CipherEntry, CipherIdentity};
use crate::config::KeyConfig;
use crate::error::ConfigError;
use crate::shadowsocks::{EncryptionKey, ShadowsocksMethod};

/// Ordered, deduplicated set of usable cipher entries
///
/// Invariants:
/// - no two entries share a [`CipherIdentity`];
/// - entries appear in the order their first occurrence was configured.
#[derive(Debug, Clone, Default)]
pub struct CipherRegistry {
    entries: Vec<CipherEntry>,
    identities: HashSet<CipherIdentity>,
}

impl CipherRegistry {
    /// Build a registry from key configurations
    ///
    /// Later keys with the same `(cipher, secret)` as an earlier key are
    /// skipped. An empty input yields an empty registry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKey` for the first key whose cipher or
    /// secret cannot produce an encryption key.
    pub fn build(configs: &[KeyConfig]) -> Result<Self, ConfigError> {
        if configs.is_empty() {
            warn!("no keys configured");
        }

        let mut registry = Self {
            entries: Vec::with_capacity(configs.len()),
            identities: HashSet::with_capacity(configs.len()),
        };

        for cfg in configs {
            let identity = CipherIdentity::from(cfg);
            if registry.identities.contains(&identity) {
                debug!(id = %cfg.id, "Encryption key already exists. Skipping.");
                continue;
            }

            let key = EncryptionKey::new(&cfg.cipher, &cfg.secret)
                .map_err(|e| ConfigError::invalid_key(cfg.id.as_str(), e))?;

            registry
                .entries
                .push(CipherEntry::new(cfg.id.as_str(), key, cfg.secret.as_str()));
            registry.identities.insert(identity);
        }

        Ok(registry)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry has no usable keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in configuration order
    pub fn iter(&self) -> std::slice::Iter<'_, CipherEntry> {
        self.entries.iter()
    }

    /// All entries in configuration order
    #[must_use]
    pub fn entries(&self) -> &[CipherEntry] {
        &self.entries
    }

    /// Entry at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CipherEntry> {
        self.entries.get(index)
    }

    /// First entry with the given id
    ///
    /// Ids are not unique; later entries sharing the id are not returned.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&CipherEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Check if a `(cipher, secret)` pair is registered
    #[must_use]
    pub fn contains_identity(&self, cipher: &str, secret: &str) -> bool {
        self.identities
            .contains(&CipherIdentity::new(cipher, secret))
    }

    /// Entry ids in configuration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(CipherEntry::id)
    }

    /// Number of entries per cipher method, in order of first appearance
    #[must_use]
    pub fn method_counts(&self) -> Vec<(ShadowsocksMethod, usize)> {
        let mut counts: Vec<(ShadowsocksMethod, usize)> = Vec::new();
        for entry in &self.entries {
            match counts.iter().position(|(method, _)| *method == entry.method()) {
                Some(pos) => counts[pos].1 += 1,
                None => counts.push((entry.method(), 1)),
            }
        }
        counts
    }
}

impl<'a> IntoIterator for &'a CipherRegistry {
    type Item = &'a CipherEntry;
    type IntoIter = std::slice::Iter<'a, CipherEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
