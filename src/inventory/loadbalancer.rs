//! HAProxy/keepalived inventory generation.

use tracing::{info, warn};

use super::artifact::{ArtifactKind, InventoryArtifact};
use super::ini::{IniDocument, quoted};
use crate::config::{EnvironmentConfig, FailoverState, NodeDeclaration};
use crate::error::{BuildError, Result};
use crate::network::{MIN_LOAD_BALANCERS, ResolvedAddressTable};

const SSH_COMMON_ARGS: &str = "'-o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null'";

/// Default failover settings for the primary and the standby node.
const FAILOVER_DEFAULTS: [(u32, FailoverState); MIN_LOAD_BALANCERS] =
    [(110, FailoverState::Master), (100, FailoverState::Backup)];

/// Builder for the load-balancer inventory.
#[derive(Debug, Clone)]
pub struct LoadBalancerBuilder {
    stamp: String,
}

impl LoadBalancerBuilder {
    /// Creates a builder that stamps the artifact with a fingerprint.
    #[must_use]
    pub fn new(stamp: impl Into<String>) -> Self {
        Self {
            stamp: stamp.into(),
        }
    }

    /// Builds the load-balancer inventory from the first two load-balancer
    /// declarations.
    ///
    /// # Errors
    ///
    /// Returns `MissingVirtualIp` when no virtual IP was resolved, or
    /// `UnknownHost` if a load balancer is absent from the table.
    pub fn build(
        &self,
        config: &EnvironmentConfig,
        table: &ResolvedAddressTable,
    ) -> Result<InventoryArtifact> {
        let virtual_ip = table.virtual_ip().ok_or(BuildError::MissingVirtualIp)?;

        let declared = &config.nodes.haproxy;
        for extra in declared.iter().skip(MIN_LOAD_BALANCERS) {
            warn!(
                "Load balancer '{}' is beyond the failover pair and is left out",
                extra.hostname
            );
        }

        let key = quoted(&config.ansible.ssh_private_key_file);
        let mut doc = IniDocument::new();
        doc.header_comment(format!(
            "HAProxy Inventory for {} Environment",
            config.environment_title()
        ))
        .header_comment(format!("Fingerprint: {}", self.stamp))
        .header_comment("DO NOT EDIT MANUALLY - Generated by invgen")
        .section("haproxy");

        for (node, (priority, state)) in declared.iter().zip(FAILOVER_DEFAULTS) {
            let ip = address_of(node, table)?;
            doc.host(
                &node.hostname,
                [
                    ("ansible_host", node.hostname.clone()),
                    ("ip", ip.to_string()),
                    (
                        "keepalived_priority",
                        node.keepalived_priority.unwrap_or(priority).to_string(),
                    ),
                    (
                        "keepalived_state",
                        node.keepalived_state.unwrap_or(state).as_str().to_string(),
                    ),
                    ("ansible_ssh_private_key_file", key.clone()),
                ],
            );
        }

        doc.section("haproxy:vars")
            .var("ansible_user", &config.ansible.user)
            .var("ansible_ssh_common_args", SSH_COMMON_ARGS)
            .var("virtual_ip", virtual_ip)
            .var("env", &config.environment);

        info!("Generated HAProxy inventory for '{}'", config.environment);
        Ok(InventoryArtifact::new(
            ArtifactKind::LoadBalancerInventory,
            doc.render(),
        ))
    }
}

fn address_of<'a>(node: &NodeDeclaration, table: &'a ResolvedAddressTable) -> Result<&'a str> {
    table.ip(&node.hostname).ok_or_else(|| {
        BuildError::UnknownHost {
            hostname: node.hostname.clone(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InventoryError;
    use crate::network::{AddressResolver, DiscoveryTable};

    fn lab_config() -> EnvironmentConfig {
        let mut config = EnvironmentConfig {
            environment: String::from("lab"),
            ..EnvironmentConfig::default()
        };
        config.nodes.masters.push(NodeDeclaration::new("m1", "192.168.56.153"));
        config.nodes.haproxy.push(NodeDeclaration::new("h1", "192.168.56.151"));
        config.nodes.haproxy.push(NodeDeclaration::new("h2", "192.168.56.152"));
        config.network.virtual_ip = Some(String::from("192.168.56.150"));
        config
    }

    fn build(config: &EnvironmentConfig) -> Result<InventoryArtifact> {
        let table = AddressResolver::new()
            .resolve(config, &DiscoveryTable::new())
            .unwrap();
        LoadBalancerBuilder::new("0123456789ab").build(config, &table)
    }

    #[test]
    fn test_failover_pair_defaults() {
        let artifact = build(&lab_config()).unwrap();
        let content = &artifact.content;

        assert!(content.starts_with("# HAProxy Inventory for Lab Environment\n"));
        assert!(content.contains(
            "[haproxy]\n\
             h1 ansible_host=h1 ip=192.168.56.151 keepalived_priority=110 keepalived_state=MASTER \
             ansible_ssh_private_key_file=\"~/.ssh/id_rsa\"\n\
             h2 ansible_host=h2 ip=192.168.56.152 keepalived_priority=100 keepalived_state=BACKUP \
             ansible_ssh_private_key_file=\"~/.ssh/id_rsa\"\n"
        ));
        assert!(content.contains(
            "[haproxy:vars]\n\
             ansible_user=root\n\
             ansible_ssh_common_args='-o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null'\n\
             virtual_ip=192.168.56.150\n\
             env=lab\n"
        ));
    }

    #[test]
    fn test_declared_failover_settings() {
        let mut config = lab_config();
        config.nodes.haproxy[0] =
            NodeDeclaration::new("h1", "192.168.56.151").with_failover(150, FailoverState::Backup);

        let artifact = build(&config).unwrap();
        assert!(artifact
            .content
            .contains("keepalived_priority=150 keepalived_state=BACKUP"));
    }

    #[test]
    fn test_extra_load_balancers_left_out() {
        let mut config = lab_config();
        config.nodes.haproxy.push(NodeDeclaration::new("h3", "192.168.56.160"));

        let artifact = build(&config).unwrap();
        assert!(!artifact.content.contains("h3"));
    }

    #[test]
    fn test_missing_virtual_ip() {
        let mut config = lab_config();
        config.network.virtual_ip = None;

        let err = build(&config).unwrap_err();
        assert!(matches!(err, InventoryError::Build(BuildError::MissingVirtualIp)));
    }
}
