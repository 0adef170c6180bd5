//! Network invariant validation.
//!
//! Runs after resolution and before any artifact is generated. Checks run in
//! a fixed order and stop at the first failing class, but every offending
//! value within that class is reported.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::table::ResolvedAddressTable;
use crate::config::EnvironmentConfig;
use crate::error::NetworkConflictError;

/// Minimum number of load-balancer nodes for a failover pair.
pub const MIN_LOAD_BALANCERS: usize = 2;

/// Validator for a resolved address set.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkValidator;

impl NetworkValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates the resolved addresses against the network invariants.
    ///
    /// # Errors
    ///
    /// Returns the first failing class: duplicate addresses, a virtual IP
    /// collision, a CIDR overlapping the host prefix, or too few load
    /// balancers.
    pub fn validate(
        &self,
        config: &EnvironmentConfig,
        table: &ResolvedAddressTable,
    ) -> Result<(), NetworkConflictError> {
        Self::check_duplicates(table)?;
        Self::check_virtual_ips(config, table)?;
        Self::check_cidrs(config)?;
        Self::check_load_balancers(config)?;

        debug!("Network configuration validation passed");
        Ok(())
    }

    fn check_duplicates(table: &ResolvedAddressTable) -> Result<(), NetworkConflictError> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in table.entries() {
            *counts.entry(entry.ip.as_str()).or_default() += 1;
        }

        // Report in first-seen order so the message is stable.
        let mut reported = HashSet::new();
        let ips: Vec<String> = table
            .entries()
            .iter()
            .map(|e| e.ip.as_str())
            .filter(|ip| counts.get(ip).copied().unwrap_or_default() > 1)
            .filter(|ip| reported.insert(*ip))
            .map(String::from)
            .collect();

        if ips.is_empty() {
            Ok(())
        } else {
            Err(NetworkConflictError::DuplicateAddress { ips })
        }
    }

    fn check_virtual_ips(
        config: &EnvironmentConfig,
        table: &ResolvedAddressTable,
    ) -> Result<(), NetworkConflictError> {
        let physical: HashSet<&str> = table.entries().iter().map(|e| e.ip.as_str()).collect();

        // The API and ingress virtual IPs must differ from every node and
        // from each other.
        let mut seen = HashSet::new();
        let mut ips: Vec<String> = Vec::new();
        for vip in [table.virtual_ip(), config.network.ingress_vip.as_deref()]
            .into_iter()
            .flatten()
        {
            let repeated = !seen.insert(vip);
            if (repeated || physical.contains(vip)) && !ips.iter().any(|ip| ip == vip) {
                ips.push(vip.to_string());
            }
        }

        if ips.is_empty() {
            Ok(())
        } else {
            Err(NetworkConflictError::VirtualIpCollision { ips })
        }
    }

    fn check_cidrs(config: &EnvironmentConfig) -> Result<(), NetworkConflictError> {
        let prefix = config.network.prefix.trim_end_matches('.');
        let cidrs: Vec<String> = [&config.network.service_cidr, &config.network.pod_cidr]
            .into_iter()
            .filter(|cidr| shares_prefix(cidr, prefix))
            .cloned()
            .collect();

        if cidrs.is_empty() {
            Ok(())
        } else {
            Err(NetworkConflictError::CidrOverlap {
                cidrs,
                prefix: prefix.to_string(),
            })
        }
    }

    fn check_load_balancers(config: &EnvironmentConfig) -> Result<(), NetworkConflictError> {
        let found = config.nodes.haproxy.len();
        if found < MIN_LOAD_BALANCERS {
            Err(NetworkConflictError::InsufficientLoadBalancers { found })
        } else {
            Ok(())
        }
    }
}

/// Whether a CIDR lies under a dotted host prefix such as `192.168.56`.
///
/// Matching stops at octet boundaries, so `192.168.5` does not cover
/// `192.168.56.0/24`.
fn shares_prefix(cidr: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    cidr.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('/'))
}
