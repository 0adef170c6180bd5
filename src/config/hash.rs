//! Configuration fingerprinting.
//!
//! This module computes deterministic hashes of a configuration and of the
//! addresses resolved from it. The short form is stamped into every
//! generated artifact, so two runs over unchanged inputs produce
//! byte-identical output.

use sha2::{Digest, Sha256};

use super::spec::EnvironmentConfig;
use crate::network::ResolvedAddressTable;

/// Hasher for computing configuration fingerprints.
#[derive(Debug, Default)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new configuration hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash of the entire environment configuration.
    #[must_use]
    pub fn hash_config(&self, config: &EnvironmentConfig) -> String {
        let mut hasher = Sha256::new();
        // Plain owned data with ordered collections only; serialization
        // cannot fail and is stable across runs.
        hasher.update(serde_json::to_vec(config).unwrap_or_default());
        hex::encode(hasher.finalize())
    }

    /// Computes the fingerprint of one compilation: the configuration plus
    /// every resolved address and the virtual IP.
    #[must_use]
    pub fn fingerprint(&self, config: &EnvironmentConfig, table: &ResolvedAddressTable) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.hash_config(config).as_bytes());

        for entry in table.entries() {
            hasher.update(entry.hostname.as_bytes());
            hasher.update([0u8]);
            hasher.update(entry.ip.as_bytes());
            hasher.update([0u8]);
        }
        if let Some(vip) = table.virtual_ip() {
            hasher.update(vip.as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 12 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(12).collect()
    }
}
