//! Kubespray inventory and group vars generation.
//!
//! Produces three artifacts from one configuration and its resolved address
//! table: the host inventory, the cluster-wide settings
//! (`group_vars/k8s_cluster.yml`), and the global settings
//! (`group_vars/all.yml`).

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::artifact::{ArtifactKind, InventoryArtifact};
use super::ini::{IniDocument, quoted};
use crate::config::{EnvironmentConfig, NodeDeclaration, NodeRole, OidcConfig, PreflightErrors};
use crate::error::{BuildError, Result};
use crate::network::ResolvedAddressTable;

/// Port the API server listens on behind the virtual IP.
pub const APISERVER_PORT: u16 = 6443;

/// Port etcd clients connect to.
pub const ETCD_CLIENT_PORT: u16 = 2379;

const PYTHON_INTERPRETER: &str = "/usr/bin/python3";
const SSH_COMMON_ARGS: &str = "'-o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null'";
const DOWNLOAD_CACHE_DIR: &str = "/tmp/kubespray_cache";

/// The three Kubespray artifacts.
#[derive(Debug, Clone)]
pub struct OrchestrationArtifacts {
    /// Host inventory.
    pub inventory: InventoryArtifact,
    /// Cluster-wide settings.
    pub cluster_vars: InventoryArtifact,
    /// Global settings.
    pub global_vars: InventoryArtifact,
}

impl IntoIterator for OrchestrationArtifacts {
    type Item = InventoryArtifact;
    type IntoIter = std::array::IntoIter<InventoryArtifact, 3>;

    fn into_iter(self) -> Self::IntoIter {
        [self.inventory, self.cluster_vars, self.global_vars].into_iter()
    }
}

/// A node with its resolved address.
struct Placed<'a> {
    hostname: &'a str,
    ip: &'a str,
}

/// Builder for the Kubespray artifacts.
#[derive(Debug, Clone)]
pub struct OrchestrationBuilder {
    stamp: String,
}

impl OrchestrationBuilder {
    /// Creates a builder that stamps artifacts with a fingerprint.
    #[must_use]
    pub fn new(stamp: impl Into<String>) -> Self {
        Self {
            stamp: stamp.into(),
        }
    }

    /// Builds the three Kubespray artifacts.
    ///
    /// # Errors
    ///
    /// Returns `MissingVirtualIp` when no virtual IP was resolved, or
    /// `UnknownHost` if a declared node is absent from the table.
    pub fn build(
        &self,
        config: &EnvironmentConfig,
        table: &ResolvedAddressTable,
    ) -> Result<OrchestrationArtifacts> {
        let virtual_ip = table.virtual_ip().ok_or(BuildError::MissingVirtualIp)?;

        let masters = place(&config.nodes.masters, table)?;
        let workers = place(&config.nodes.workers, table)?;
        if masters.is_empty() && workers.is_empty() {
            return Err(BuildError::generation(
                ArtifactKind::OrchestrationInventory.name(),
                "no master or worker nodes declared",
            )
            .into());
        }
        debug!(
            "Building Kubespray artifacts for {} masters and {} workers",
            masters.len(),
            workers.len()
        );

        let interface = &config.network.interface_config;
        if interface.force_cluster_network {
            debug!(
                "Pinning etcd and certificate addresses to the {} network",
                interface.cluster_interface
            );
        }

        let inventory = self.render_inventory(config, &masters, &workers);
        let cluster_vars = self.render_cluster_vars(config, table, &masters, virtual_ip)?;
        let global_vars = self.render_global_vars(config, &masters)?;

        info!("Generated Kubespray inventory for '{}'", config.environment);
        Ok(OrchestrationArtifacts {
            inventory: InventoryArtifact::new(ArtifactKind::OrchestrationInventory, inventory),
            cluster_vars: InventoryArtifact::new(
                ArtifactKind::OrchestrationClusterVars,
                cluster_vars,
            ),
            global_vars: InventoryArtifact::new(ArtifactKind::OrchestrationGlobalVars, global_vars),
        })
    }

    fn render_inventory(
        &self,
        config: &EnvironmentConfig,
        masters: &[Placed<'_>],
        workers: &[Placed<'_>],
    ) -> String {
        let key = quoted(&config.ansible.ssh_private_key_file);
        let mut doc = IniDocument::new();
        doc.header_comment(format!(
            "Kubespray Inventory for {} Environment",
            config.environment_title()
        ))
        .header_comment(format!("Fingerprint: {}", self.stamp))
        .header_comment("DO NOT EDIT MANUALLY - Generated by invgen")
        .section("all");

        for node in masters.iter().chain(workers) {
            doc.host(
                node.hostname,
                [
                    ("ansible_host", node.hostname.to_string()),
                    ("ansible_user", config.ansible.user.clone()),
                    ("ansible_ssh_private_key_file", key.clone()),
                    ("ansible_python_interpreter", PYTHON_INTERPRETER.to_string()),
                    ("ip", node.ip.to_string()),
                    ("access_ip", node.ip.to_string()),
                ],
            );
        }

        // etcd runs on exactly the control-plane nodes.
        for group in ["kube_control_plane", "etcd"] {
            doc.section(group);
            for node in masters {
                doc.line(node.hostname);
            }
        }
        doc.section("kube_node");
        for node in workers {
            doc.line(node.hostname);
        }

        doc.section("calico_rr")
            .section("k8s_cluster:children")
            .line("kube_control_plane")
            .line("kube_node")
            .line("calico_rr")
            .section("all:vars")
            .var("ansible_ssh_common_args", SSH_COMMON_ARGS);

        doc.render()
    }

    fn render_cluster_vars(
        &self,
        config: &EnvironmentConfig,
        table: &ResolvedAddressTable,
        masters: &[Placed<'_>],
        virtual_ip: &str,
    ) -> Result<String> {
        let services = &config.services;
        let network = &config.network;
        let mirrors = config
            .registry
            .as_ref()
            .map(|r| r.active_mirrors())
            .unwrap_or_default();
        let bootstrap_address = table
            .by_role(NodeRole::LoadBalancer)
            .next()
            .map_or(virtual_ip, |lb| lb.ip.as_str());

        let vars = ClusterVars {
            ansible_become: true,
            authorization_modes: ["Node", "RBAC"],
            cluster_name: config.cluster_name(),
            dashboard_enabled: services.dashboard(),
            dns_domain: config.dns_domain(),
            dns_mode: "coredns",
            download_localhost: false,
            download_run_once: false,
            enable_nodelocaldns: false,
            helm_enabled: services.helm(),
            ingress_nginx_enabled: services.ingress(),
            ingress_nginx_host_network: false,
            ingress_nginx_insecure_port: 80,
            ingress_nginx_namespace: "ingress-nginx",
            ingress_nginx_nodeport_http: config.haproxy.ingress_http_nodeport,
            ingress_nginx_nodeport_https: config.haproxy.ingress_https_nodeport,
            ingress_nginx_nodeselector: BTreeMap::new(),
            ingress_nginx_secure_port: 443,
            ingress_nginx_service_type: "NodePort",
            kube_network_plugin: &network.cni,
            metrics_server_enabled: services.metrics_server(),
            rbac_enabled: services.rbac(),
            kube_service_addresses: &network.service_cidr,
            kube_pods_subnet: &network.pod_cidr,
            kubeadm_ignore_preflight_errors: config
                .kubeadm_ignore_preflight_errors
                .as_ref()
                .map(PreflightErrors::to_list),
            oidc: config
                .oidc
                .as_ref()
                .filter(|o| o.enabled)
                .map(OidcVars::from_config),
            upstream_dns_servers: network.dns_servers.iter().map(String::as_str).collect(),
            quay_image_repo: config.quay_image_repo.as_deref().filter(|r| !r.is_empty()),
            docker_registry_mirrors: mirrors.iter().map(String::as_str).collect(),
            containerd_registries_mirrors: containerd_registries(mirrors),
            kube_apiserver_bootstrap_address: bootstrap_address,
            loadbalancer_apiserver: ApiServerEndpoint {
                address: virtual_ip,
                port: APISERVER_PORT,
            },
            apiserver_loadbalancer_domain_name: virtual_ip,
            loadbalancer_apiserver_port: APISERVER_PORT,
            etcd: (network.interface_config.force_cluster_network && !masters.is_empty())
                .then(|| EtcdVars::for_masters(masters)),
        };

        let title = format!(
            "Kubespray cluster settings for {} Environment",
            config.environment_title()
        );
        self.render_yaml(ArtifactKind::OrchestrationClusterVars, &title, &vars)
    }

    fn render_global_vars(
        &self,
        config: &EnvironmentConfig,
        masters: &[Placed<'_>],
    ) -> Result<String> {
        let force = config.network.interface_config.force_cluster_network;
        let vars = GlobalVars {
            bootstrap_os: &config.cluster.bootstrap_os,
            download_cache_dir: DOWNLOAD_CACHE_DIR,
            cluster_network: (force && !masters.is_empty()).then(|| {
                let ips: Vec<&str> = masters.iter().map(|m| m.ip).collect();
                ClusterNetworkVars {
                    supplementary_addresses_in_ssl_keys: ips.clone(),
                    fallback_ips: ips,
                    override_system_hostname: false,
                }
            }),
        };

        self.render_yaml(
            ArtifactKind::OrchestrationGlobalVars,
            "Global Kubespray configuration",
            &vars,
        )
    }

    /// Serializes a settings document behind the standard comment header.
    fn render_yaml<T: Serialize>(&self, kind: ArtifactKind, title: &str, vars: &T) -> Result<String> {
        let body = serde_yaml::to_string(vars)
            .map_err(|e| BuildError::generation(kind.name(), e.to_string()))?;
        Ok(format!(
            "# {title}\n# Fingerprint: {}\n# DO NOT EDIT MANUALLY - Generated by invgen\n\n{body}",
            self.stamp
        ))
    }
}

/// `group_vars/k8s_cluster.yml`, keys in emission order.
#[derive(Debug, Serialize)]
struct ClusterVars<'a> {
    ansible_become: bool,
    authorization_modes: [&'static str; 2],
    cluster_name: String,
    dashboard_enabled: bool,
    dns_domain: String,
    dns_mode: &'static str,
    download_localhost: bool,
    download_run_once: bool,
    enable_nodelocaldns: bool,
    helm_enabled: bool,
    ingress_nginx_enabled: bool,
    ingress_nginx_host_network: bool,
    ingress_nginx_insecure_port: u16,
    ingress_nginx_namespace: &'static str,
    ingress_nginx_nodeport_http: u16,
    ingress_nginx_nodeport_https: u16,
    ingress_nginx_nodeselector: BTreeMap<String, String>,
    ingress_nginx_secure_port: u16,
    ingress_nginx_service_type: &'static str,
    kube_network_plugin: &'a str,
    metrics_server_enabled: bool,
    rbac_enabled: bool,
    kube_service_addresses: &'a str,
    kube_pods_subnet: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kubeadm_ignore_preflight_errors: Option<Vec<String>>,
    #[serde(flatten)]
    oidc: Option<OidcVars<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    upstream_dns_servers: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quay_image_repo: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    docker_registry_mirrors: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    containerd_registries_mirrors: Vec<ContainerdRegistry<'a>>,
    kube_apiserver_bootstrap_address: &'a str,
    loadbalancer_apiserver: ApiServerEndpoint<'a>,
    apiserver_loadbalancer_domain_name: &'a str,
    loadbalancer_apiserver_port: u16,
    #[serde(flatten)]
    etcd: Option<EtcdVars<'a>>,
}

#[derive(Debug, Serialize)]
struct OidcVars<'a> {
    kube_oidc_auth: bool,
    kube_oidc_url: &'a str,
    kube_oidc_client_id: &'a str,
    kube_oidc_username_claim: &'a str,
    kube_oidc_username_prefix: &'a str,
    kube_oidc_groups_claim: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kube_oidc_groups_prefix: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kube_oidc_ca_file: Option<&'a str>,
}

impl<'a> OidcVars<'a> {
    fn from_config(oidc: &'a OidcConfig) -> Self {
        Self {
            kube_oidc_auth: true,
            kube_oidc_url: &oidc.issuer_url,
            kube_oidc_client_id: &oidc.client_id,
            kube_oidc_username_claim: &oidc.username_claim,
            kube_oidc_username_prefix: &oidc.username_prefix,
            kube_oidc_groups_claim: &oidc.groups_claim,
            kube_oidc_groups_prefix: oidc.groups_prefix.as_deref().filter(|p| !p.is_empty()),
            kube_oidc_ca_file: oidc.ca_file.as_deref().filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ContainerdRegistry<'a> {
    prefix: &'static str,
    mirrors: Vec<ContainerdMirror<'a>>,
}

#[derive(Debug, Serialize)]
struct ContainerdMirror<'a> {
    host: &'a str,
    capabilities: [&'static str; 2],
    skip_verify: bool,
}

#[derive(Debug, Serialize)]
struct ApiServerEndpoint<'a> {
    address: &'a str,
    port: u16,
}

/// etcd endpoints and certificate names, pinned to the master IPs.
#[derive(Debug, Serialize)]
struct EtcdVars<'a> {
    etcd_access_addresses: String,
    etcd_cert_alt_names: Vec<&'a str>,
    etcd_cert_alt_ips: Vec<&'a str>,
}

impl<'a> EtcdVars<'a> {
    fn for_masters(masters: &[Placed<'a>]) -> Self {
        let ips: Vec<&'a str> = masters.iter().map(|m| m.ip).collect();
        // Kubespray splits this on commas, so it stays a single string.
        let etcd_access_addresses = ips
            .iter()
            .map(|ip| format!("https://{ip}:{ETCD_CLIENT_PORT}"))
            .collect::<Vec<_>>()
            .join(",");
        Self {
            etcd_access_addresses,
            etcd_cert_alt_names: ips.clone(),
            etcd_cert_alt_ips: ips,
        }
    }
}

/// `group_vars/all.yml`.
#[derive(Debug, Serialize)]
struct GlobalVars<'a> {
    bootstrap_os: &'a str,
    download_cache_dir: &'static str,
    #[serde(flatten)]
    cluster_network: Option<ClusterNetworkVars<'a>>,
}

#[derive(Debug, Serialize)]
struct ClusterNetworkVars<'a> {
    supplementary_addresses_in_ssl_keys: Vec<&'a str>,
    fallback_ips: Vec<&'a str>,
    override_system_hostname: bool,
}

/// Looks up each declaration in the table, keeping declaration order.
fn place<'a>(
    declarations: &'a [NodeDeclaration],
    table: &'a ResolvedAddressTable,
) -> Result<Vec<Placed<'a>>> {
    declarations
        .iter()
        .map(|node| {
            table
                .ip(&node.hostname)
                .map(|ip| Placed {
                    hostname: node.hostname.as_str(),
                    ip,
                })
                .ok_or_else(|| {
                    BuildError::UnknownHost {
                        hostname: node.hostname.clone(),
                    }
                    .into()
                })
        })
        .collect()
}

/// containerd mirror entries for the `docker.io` prefix.
fn containerd_registries(mirrors: &[String]) -> Vec<ContainerdRegistry<'_>> {
    if mirrors.is_empty() {
        return Vec::new();
    }
    vec![ContainerdRegistry {
        prefix: "docker.io",
        mirrors: mirrors
            .iter()
            .map(|host| ContainerdMirror {
                host,
                capabilities: ["pull", "resolve"],
                skip_verify: false,
            })
            .collect(),
    }]
}
