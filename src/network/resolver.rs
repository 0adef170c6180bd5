//! Address resolution.
//!
//! Each hostname is resolved by walking an ordered list of lookup strategies
//! and taking the first hit. The default order is discovery, then the
//! declared address, then a prefix-derived default.

use std::net::IpAddr;
use tracing::{debug, warn};

use super::discovery::{DiscoveryTable, VIRTUAL_IP_KEY};
use super::table::{AddressSource, ResolvedAddress, ResolvedAddressTable};
use crate::config::{EnvironmentConfig, NetworkConfig, NodeDeclaration, NodeRole};
use crate::error::{AddressResolutionError, ConfigError, Result};

/// Everything a strategy may consult for one host.
#[derive(Debug, Clone, Copy)]
pub struct LookupContext<'a> {
    /// The node being resolved.
    pub declaration: &'a NodeDeclaration,
    /// Its role.
    pub role: NodeRole,
    /// Its position within its role list.
    pub position: usize,
    /// The discovery table for this run.
    pub discovered: &'a DiscoveryTable,
    /// Network parameters.
    pub network: &'a NetworkConfig,
}

/// One step of the resolution precedence chain.
pub trait LookupStrategy: std::fmt::Debug {
    /// The source recorded for addresses this strategy yields.
    fn source(&self) -> AddressSource;

    /// Returns an address for the host, if this strategy knows one.
    fn lookup(&self, ctx: &LookupContext<'_>) -> Option<String>;
}

/// Takes the address from the discovery table.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscoveredLookup;

impl LookupStrategy for DiscoveredLookup {
    fn source(&self) -> AddressSource {
        AddressSource::Discovered
    }

    fn lookup(&self, ctx: &LookupContext<'_>) -> Option<String> {
        ctx.discovered
            .get(&ctx.declaration.hostname)
            .filter(|ip| !ip.is_empty())
            .cloned()
    }
}

/// Takes the address declared on the node.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredLookup;

impl LookupStrategy for DeclaredLookup {
    fn source(&self) -> AddressSource {
        AddressSource::Declared
    }

    fn lookup(&self, ctx: &LookupContext<'_>) -> Option<String> {
        ctx.declaration.ip.clone().filter(|ip| !ip.is_empty())
    }
}

/// Derives `<prefix>.<base + position>` where the base octet depends on role.
///
/// Masters start at `.153`, workers at `.163`, load balancers at `.151`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComputedDefaultLookup;

impl ComputedDefaultLookup {
    /// Returns the first host octet used for a role.
    #[must_use]
    pub const fn base_octet(role: NodeRole) -> usize {
        match role {
            NodeRole::Master => 153,
            NodeRole::Worker => 163,
            NodeRole::LoadBalancer => 151,
        }
    }
}

impl LookupStrategy for ComputedDefaultLookup {
    fn source(&self) -> AddressSource {
        AddressSource::ComputedDefault
    }

    fn lookup(&self, ctx: &LookupContext<'_>) -> Option<String> {
        if !ctx.network.allow_computed_addresses {
            return None;
        }

        let prefix = ctx.network.prefix.trim_end_matches('.');
        if prefix.is_empty() {
            return None;
        }

        let octet = Self::base_octet(ctx.role).checked_add(ctx.position)?;
        if octet > 254 {
            return None;
        }

        let ip = format!("{prefix}.{octet}");
        warn!(
            "No address for {} '{}', using calculated default {ip}",
            ctx.role, ctx.declaration.hostname
        );
        Some(ip)
    }
}

/// Resolves every declared host to exactly one address.
#[derive(Debug)]
pub struct AddressResolver {
    strategies: Vec<Box<dyn LookupStrategy>>,
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressResolver {
    /// Creates a resolver with the standard precedence:
    /// discovered, declared, computed default.
    #[must_use]
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(DiscoveredLookup),
            Box::new(DeclaredLookup),
            Box::new(ComputedDefaultLookup),
        ])
    }

    /// Creates a resolver that never derives addresses.
    #[must_use]
    pub fn strict() -> Self {
        Self::with_strategies(vec![Box::new(DiscoveredLookup), Box::new(DeclaredLookup)])
    }

    /// Creates a resolver with a custom strategy order.
    #[must_use]
    pub fn with_strategies(strategies: Vec<Box<dyn LookupStrategy>>) -> Self {
        Self { strategies }
    }

    /// Returns the precedence order, highest first.
    #[must_use]
    pub fn precedence(&self) -> Vec<AddressSource> {
        self.strategies.iter().map(|s| s.source()).collect()
    }

    /// Resolves all master, worker, and load-balancer hosts.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryFailed` if a discovered value is not an IP address,
    /// `MissingAddress` if no strategy yields an address for a host, or
    /// `DuplicateName` if a hostname is declared twice.
    pub fn resolve(
        &self,
        config: &EnvironmentConfig,
        discovered: &DiscoveryTable,
    ) -> Result<ResolvedAddressTable> {
        check_discovered(discovered)?;
        let mut table = ResolvedAddressTable::new();

        for role in [NodeRole::Master, NodeRole::Worker, NodeRole::LoadBalancer] {
            for (position, declaration) in config.nodes.by_role(role).iter().enumerate() {
                let ctx = LookupContext {
                    declaration,
                    role,
                    position,
                    discovered,
                    network: &config.network,
                };
                let entry = self.resolve_one(&ctx)?;
                debug!(
                    "Resolved {} '{}' -> {} ({:?})",
                    role, entry.hostname, entry.ip, entry.source
                );

                if !table.insert(entry) {
                    return Err(ConfigError::DuplicateName {
                        resource_type: String::from("node"),
                        name: declaration.hostname.clone(),
                    }
                    .into());
                }
            }
        }

        let virtual_ip = discovered
            .get(VIRTUAL_IP_KEY)
            .filter(|ip| !ip.is_empty())
            .map(String::as_str)
            .or_else(|| config.configured_virtual_ip())
            .map(String::from);
        table.set_virtual_ip(virtual_ip);

        Ok(table)
    }

    fn resolve_one(&self, ctx: &LookupContext<'_>) -> Result<ResolvedAddress> {
        self.strategies
            .iter()
            .find_map(|strategy| {
                strategy.lookup(ctx).map(|ip| ResolvedAddress {
                    hostname: ctx.declaration.hostname.clone(),
                    ip,
                    role: ctx.role,
                    source: strategy.source(),
                })
            })
            .ok_or_else(|| {
                AddressResolutionError::MissingAddress {
                    hostname: ctx.declaration.hostname.clone(),
                }
                .into()
            })
    }
}

/// Rejects discovered values that are not IP literals. Empty values count as
/// absent.
fn check_discovered(discovered: &DiscoveryTable) -> Result<()> {
    let invalid: Vec<String> = discovered
        .iter()
        .filter(|(_, ip)| !ip.is_empty() && ip.parse::<IpAddr>().is_err())
        .map(|(hostname, ip)| format!("{hostname}={ip}"))
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(AddressResolutionError::DiscoveryFailed {
            message: format!("not an IP address: {}", invalid.join(", ")),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InventoryError;

    fn sample_config() -> EnvironmentConfig {
        let mut config = EnvironmentConfig {
            environment: String::from("lab"),
            ..EnvironmentConfig::default()
        };
        config.nodes.masters.push(NodeDeclaration::new("m1", "192.168.56.153"));
        config.nodes.workers.push(NodeDeclaration::new("w1", "192.168.56.163"));
        config.nodes.haproxy.push(NodeDeclaration::new("h1", "192.168.56.151"));
        config.nodes.haproxy.push(NodeDeclaration::new("h2", "192.168.56.152"));
        config.network.virtual_ip = Some(String::from("192.168.56.150"));
        config
    }

    #[test]
    fn test_declared_addresses_with_empty_discovery() {
        let config = sample_config();
        let table = AddressResolver::new()
            .resolve(&config, &DiscoveryTable::new())
            .unwrap();

        assert_eq!(table.len(), 4);
        for (_, declaration) in config.declarations() {
            let entry = table.get(&declaration.hostname).unwrap();
            assert_eq!(Some(&entry.ip), declaration.ip.as_ref());
            assert_eq!(entry.source, AddressSource::Declared);
        }
        assert_eq!(table.virtual_ip(), Some("192.168.56.150"));
    }

    #[test]
    fn test_discovered_address_wins() {
        let config = sample_config();
        let mut discovered = DiscoveryTable::new();
        discovered.insert(String::from("w1"), String::from("10.9.9.9"));
        discovered.insert(String::from(VIRTUAL_IP_KEY), String::from("10.9.9.100"));

        let table = AddressResolver::new().resolve(&config, &discovered).unwrap();
        let w1 = table.get("w1").unwrap();
        assert_eq!(w1.ip, "10.9.9.9");
        assert_eq!(w1.source, AddressSource::Discovered);
        assert_eq!(table.ip("m1"), Some("192.168.56.153"));
        assert_eq!(table.virtual_ip(), Some("10.9.9.100"));
    }

    #[test]
    fn test_discovered_value_must_be_ip() {
        let config = sample_config();
        let mut discovered = DiscoveryTable::new();
        discovered.insert(String::from("m1"), String::from("foo"));
        discovered.insert(String::from("w1"), String::from(""));

        let result = AddressResolver::new().resolve(&config, &discovered);
        match result {
            Err(InventoryError::Address(AddressResolutionError::DiscoveryFailed { message })) => {
                assert!(message.contains("m1=foo"));
                assert!(!message.contains("w1"));
            }
            other => panic!("expected DiscoveryFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_computed_default_fallback() {
        let mut config = sample_config();
        config.nodes.workers.push(NodeDeclaration::unaddressed("w2"));

        let table = AddressResolver::new()
            .resolve(&config, &DiscoveryTable::new())
            .unwrap();
        let w2 = table.get("w2").unwrap();
        assert_eq!(w2.ip, "192.168.56.164");
        assert_eq!(w2.source, AddressSource::ComputedDefault);
    }

    #[test]
    fn test_missing_address_when_fallback_disabled() {
        let mut config = sample_config();
        config.network.allow_computed_addresses = false;
        config.nodes.masters.push(NodeDeclaration::unaddressed("m2"));

        let result = AddressResolver::new().resolve(&config, &DiscoveryTable::new());
        match result {
            Err(InventoryError::Address(AddressResolutionError::MissingAddress { hostname })) => {
                assert_eq!(hostname, "m2");
            }
            other => panic!("expected MissingAddress, got {other:?}"),
        }
    }

    #[test]
    fn test_strict_resolver_never_computes() {
        let mut config = sample_config();
        config.nodes.workers.push(NodeDeclaration::unaddressed("w2"));

        let resolver = AddressResolver::strict();
        assert_eq!(
            resolver.precedence(),
            vec![AddressSource::Discovered, AddressSource::Declared]
        );
        assert!(resolver.resolve(&config, &DiscoveryTable::new()).is_err());
    }

    #[test]
    fn test_duplicate_hostname_rejected() {
        let mut config = sample_config();
        config.nodes.workers.push(NodeDeclaration::new("m1", "192.168.56.170"));

        let result = AddressResolver::new().resolve(&config, &DiscoveryTable::new());
        assert!(matches!(
            result,
            Err(InventoryError::Config(ConfigError::DuplicateName { .. }))
        ));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let config = sample_config();
        let resolver = AddressResolver::new();
        let first = resolver.resolve(&config, &DiscoveryTable::new()).unwrap();
        let second = resolver.resolve(&config, &DiscoveryTable::new()).unwrap();
        assert_eq!(first.entries(), second.entries());
    }
}
