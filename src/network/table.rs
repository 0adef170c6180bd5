//! Resolved address table.
//!
//! The table is the single source of node addresses for every builder. It is
//! derived fresh on each compilation and never cached.

use serde::Serialize;
use std::collections::HashMap;

use crate::config::NodeRole;

/// Where a resolved address came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AddressSource {
    /// Supplied by the discovery capability.
    Discovered,
    /// Declared on the node in configuration.
    Declared,
    /// Derived from the network prefix.
    ComputedDefault,
}

/// A single resolved node address.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedAddress {
    /// Node hostname.
    pub hostname: String,
    /// Final IP address.
    pub ip: String,
    /// Declared role.
    pub role: NodeRole,
    /// Strategy that produced the address.
    pub source: AddressSource,
}

/// Mapping from hostname to final address, in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedAddressTable {
    entries: Vec<ResolvedAddress>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    virtual_ip: Option<String>,
}

impl ResolvedAddressTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Returns false if the hostname is already present.
    pub fn insert(&mut self, entry: ResolvedAddress) -> bool {
        if self.index.contains_key(&entry.hostname) {
            return false;
        }
        self.index.insert(entry.hostname.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Sets the resolved virtual IP.
    pub fn set_virtual_ip(&mut self, ip: Option<String>) {
        self.virtual_ip = ip;
    }

    /// Looks up an entry by hostname.
    #[must_use]
    pub fn get(&self, hostname: &str) -> Option<&ResolvedAddress> {
        self.index.get(hostname).map(|&i| &self.entries[i])
    }

    /// Looks up the address of a hostname.
    #[must_use]
    pub fn ip(&self, hostname: &str) -> Option<&str> {
        self.get(hostname).map(|e| e.ip.as_str())
    }

    /// Returns the resolved virtual IP, if any.
    #[must_use]
    pub fn virtual_ip(&self) -> Option<&str> {
        self.virtual_ip.as_deref()
    }

    /// Returns all entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[ResolvedAddress] {
        &self.entries
    }

    /// Returns the entries of one role, in declaration order.
    pub fn by_role(&self, role: NodeRole) -> impl Iterator<Item = &ResolvedAddress> {
        self.entries.iter().filter(move |e| e.role == role)
    }

    /// Returns the number of resolved hosts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no host is resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hostname: &str, ip: &str, role: NodeRole) -> ResolvedAddress {
        ResolvedAddress {
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            role,
            source: AddressSource::Declared,
        }
    }

    #[test]
    fn test_insert_rejects_duplicate_hostname() {
        let mut table = ResolvedAddressTable::new();
        assert!(table.insert(entry("m1", "10.0.0.1", NodeRole::Master)));
        assert!(!table.insert(entry("m1", "10.0.0.2", NodeRole::Worker)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.ip("m1"), Some("10.0.0.1"));
    }

    #[test]
    fn test_by_role_keeps_order() {
        let mut table = ResolvedAddressTable::new();
        table.insert(entry("m1", "10.0.0.1", NodeRole::Master));
        table.insert(entry("w1", "10.0.0.2", NodeRole::Worker));
        table.insert(entry("m2", "10.0.0.3", NodeRole::Master));

        let masters: Vec<_> = table.by_role(NodeRole::Master).map(|e| e.hostname.as_str()).collect();
        assert_eq!(masters, vec!["m1", "m2"]);
        assert!(table.get("w9").is_none());
    }
}
