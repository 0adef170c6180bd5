//! Configuration specification types for the inventory compiler.
//!
//! This module defines all the structs that map to an environment's
//! `vars.yml`. A loaded [`EnvironmentConfig`] is never mutated by the
//! compiler; every run derives its artifacts from it afresh.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// The root configuration structure for one environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct EnvironmentConfig {
    /// Environment name (lowercase), filled in by the loader.
    #[serde(default)]
    pub environment: String,
    /// Cluster identity.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Node declarations grouped by role.
    #[serde(default)]
    #[validate(nested)]
    pub nodes: NodesConfig,
    /// Network parameters.
    #[serde(default)]
    #[validate(nested)]
    pub network: NetworkConfig,
    /// SSH parameters used by the generated inventories.
    #[serde(default)]
    pub ansible: AnsibleConfig,
    /// Service toggles.
    #[serde(default)]
    pub services: ServicesConfig,
    /// Load-balancer front-end settings.
    #[serde(default)]
    pub haproxy: HaproxyConfig,
    /// Optional OIDC authentication block.
    #[serde(default)]
    pub oidc: Option<OidcConfig>,
    /// Optional kubeadm preflight errors to ignore.
    #[serde(default)]
    pub kubeadm_ignore_preflight_errors: Option<PreflightErrors>,
    /// Optional quay.io replacement repository.
    #[serde(default)]
    pub quay_image_repo: Option<String>,
    /// Optional registry mirror block.
    #[serde(default)]
    pub registry: Option<RegistryConfig>,
}

/// Cluster identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Cluster name; defaults to `k8s-<environment>`.
    #[serde(default)]
    pub name: Option<String>,
    /// Base operating system of the nodes.
    #[serde(default = "default_bootstrap_os")]
    pub bootstrap_os: String,
}

/// Node declarations grouped by role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct NodesConfig {
    /// Control-plane nodes.
    #[serde(default)]
    #[validate(nested)]
    pub masters: Vec<NodeDeclaration>,
    /// Worker nodes.
    #[serde(default)]
    #[validate(nested)]
    pub workers: Vec<NodeDeclaration>,
    /// Load-balancer nodes.
    #[serde(default, alias = "loadbalancers")]
    #[validate(nested)]
    pub haproxy: Vec<NodeDeclaration>,
}

/// A single node declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct NodeDeclaration {
    /// Hostname, unique across all roles.
    #[validate(length(min = 1, message = "hostname cannot be empty"))]
    pub hostname: String,
    /// Statically declared address.
    #[serde(default)]
    #[validate(ip)]
    pub ip: Option<String>,
    /// Failover priority (load balancers only).
    #[serde(default)]
    pub keepalived_priority: Option<u32>,
    /// Failover state (load balancers only).
    #[serde(default)]
    pub keepalived_state: Option<FailoverState>,
}

/// Role of a node, given by the list it is declared in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Control-plane node.
    Master,
    /// Worker node.
    Worker,
    /// Load-balancer node.
    #[serde(rename = "loadbalancer")]
    LoadBalancer,
}

/// keepalived failover state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum FailoverState {
    /// Holds the virtual IP at startup.
    Master,
    /// Takes over the virtual IP on failure.
    Backup,
}

/// Network parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct NetworkConfig {
    /// Host network prefix, e.g. `192.168.56`.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Kubernetes service CIDR.
    #[serde(default = "default_service_cidr")]
    pub service_cidr: String,
    /// Kubernetes pod CIDR.
    #[serde(default = "default_pod_cidr")]
    pub pod_cidr: String,
    /// Shared virtual IP of the load-balancer pair.
    #[serde(default)]
    #[validate(ip)]
    pub virtual_ip: Option<String>,
    /// Legacy name for `virtual_ip`.
    #[serde(default)]
    #[validate(ip)]
    pub api_vip: Option<String>,
    /// Optional dedicated ingress virtual IP.
    #[serde(default)]
    #[validate(ip)]
    pub ingress_vip: Option<String>,
    /// Upstream DNS servers.
    #[serde(default)]
    pub dns_servers: Vec<String>,
    /// CNI plugin.
    #[serde(default = "default_cni")]
    pub cni: String,
    /// Whether hosts without any address may fall back to a prefix-derived one.
    #[serde(default = "default_allow_computed")]
    pub allow_computed_addresses: bool,
    /// Cluster network interface settings.
    #[serde(default)]
    pub interface_config: InterfaceConfig,
}

/// Which host interface carries cluster traffic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterfaceConfig {
    /// Interface on the cluster network, e.g. `enp0s8` on VirtualBox.
    #[serde(default = "default_cluster_interface")]
    pub cluster_interface: String,
    /// Pin etcd and certificate addresses to the resolved node IPs instead
    /// of letting Kubespray pick the default-route interface.
    #[serde(default = "default_force_cluster_network")]
    pub force_cluster_network: bool,
}

/// SSH parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnsibleConfig {
    /// Remote user.
    #[serde(default = "default_ansible_user")]
    pub user: String,
    /// Private key path, emitted verbatim.
    #[serde(default = "default_ssh_key")]
    pub ssh_private_key_file: String,
}

/// Service toggles. Each flag reads its primary key first, then its legacy
/// alias, then defaults to enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicesConfig {
    /// Primary helm toggle.
    #[serde(default)]
    pub deploy_helm: Option<bool>,
    /// Legacy helm toggle.
    #[serde(default)]
    pub helm_enabled: Option<bool>,
    /// Primary metrics-server toggle.
    #[serde(default)]
    pub deploy_metrics_server: Option<bool>,
    /// Legacy metrics-server toggle.
    #[serde(default)]
    pub metrics_server_enabled: Option<bool>,
    /// Primary ingress toggle.
    #[serde(default)]
    pub deploy_ingress: Option<bool>,
    /// Legacy ingress toggle.
    #[serde(default)]
    pub ingress_enabled: Option<bool>,
    /// Primary dashboard toggle.
    #[serde(default)]
    pub deploy_dashboard: Option<bool>,
    /// Legacy dashboard toggle.
    #[serde(default)]
    pub dashboard_enabled: Option<bool>,
    /// RBAC toggle.
    #[serde(default)]
    pub deploy_rbac: Option<bool>,
}

/// Load-balancer front-end settings consumed by the cluster settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HaproxyConfig {
    /// NodePort that HAProxy forwards plain HTTP to.
    #[serde(default = "default_http_nodeport")]
    pub ingress_http_nodeport: u16,
    /// NodePort that HAProxy forwards HTTPS to.
    #[serde(default = "default_https_nodeport")]
    pub ingress_https_nodeport: u16,
}

/// OIDC authentication block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OidcConfig {
    /// Whether OIDC is emitted at all.
    #[serde(default)]
    pub enabled: bool,
    /// Issuer URL.
    #[serde(default)]
    pub issuer_url: String,
    /// Client ID.
    #[serde(default)]
    pub client_id: String,
    /// Username claim.
    #[serde(default = "default_username_claim")]
    pub username_claim: String,
    /// Username prefix.
    #[serde(default = "default_username_prefix")]
    pub username_prefix: String,
    /// Groups claim.
    #[serde(default = "default_groups_claim")]
    pub groups_claim: String,
    /// Groups prefix.
    #[serde(default)]
    pub groups_prefix: Option<String>,
    /// CA bundle path.
    #[serde(default)]
    pub ca_file: Option<String>,
}

/// Preflight errors, as a list or a comma-separated string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PreflightErrors {
    /// Already a list.
    List(Vec<String>),
    /// Comma-separated string.
    Csv(String),
}

/// Registry mirror block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Whether mirrors are emitted.
    #[serde(default)]
    pub enabled: bool,
    /// Mirror hosts.
    #[serde(default)]
    pub mirrors: Vec<String>,
}

// Default value functions

fn default_bootstrap_os() -> String {
    String::from("ubuntu")
}

fn default_prefix() -> String {
    String::from("192.168.56")
}

fn default_service_cidr() -> String {
    String::from("10.233.0.0/18")
}

fn default_pod_cidr() -> String {
    String::from("10.233.64.0/18")
}

fn default_cni() -> String {
    String::from("calico")
}

const fn default_allow_computed() -> bool {
    true
}

fn default_cluster_interface() -> String {
    String::from("enp0s8")
}

const fn default_force_cluster_network() -> bool {
    true
}

fn default_ansible_user() -> String {
    String::from("root")
}

fn default_ssh_key() -> String {
    String::from("~/.ssh/id_rsa")
}

const fn default_http_nodeport() -> u16 {
    30080
}

const fn default_https_nodeport() -> u16 {
    30443
}

fn default_username_claim() -> String {
    String::from("username")
}

fn default_username_prefix() -> String {
    String::from("oidc:")
}

fn default_groups_claim() -> String {
    String::from("groups")
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: None,
            bootstrap_os: default_bootstrap_os(),
        }
    }
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            issuer_url: String::new(),
            client_id: String::new(),
            username_claim: default_username_claim(),
            username_prefix: default_username_prefix(),
            groups_claim: default_groups_claim(),
            groups_prefix: None,
            ca_file: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            service_cidr: default_service_cidr(),
            pod_cidr: default_pod_cidr(),
            virtual_ip: None,
            api_vip: None,
            ingress_vip: None,
            dns_servers: Vec::new(),
            cni: default_cni(),
            allow_computed_addresses: default_allow_computed(),
            interface_config: InterfaceConfig::default(),
        }
    }
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            cluster_interface: default_cluster_interface(),
            force_cluster_network: default_force_cluster_network(),
        }
    }
}

impl Default for AnsibleConfig {
    fn default() -> Self {
        Self {
            user: default_ansible_user(),
            ssh_private_key_file: default_ssh_key(),
        }
    }
}

impl Default for HaproxyConfig {
    fn default() -> Self {
        Self {
            ingress_http_nodeport: default_http_nodeport(),
            ingress_https_nodeport: default_https_nodeport(),
        }
    }
}

impl EnvironmentConfig {
    /// Returns the cluster name, defaulting to `k8s-<environment>`.
    #[must_use]
    pub fn cluster_name(&self) -> String {
        self.cluster
            .name
            .clone()
            .unwrap_or_else(|| format!("k8s-{}", self.environment))
    }

    /// Returns the DNS domain derived from the environment name.
    #[must_use]
    pub fn dns_domain(&self) -> String {
        format!("{}.local", self.environment)
    }

    /// Returns the environment name in title case, for artifact headers.
    #[must_use]
    pub fn environment_title(&self) -> String {
        let mut chars = self.environment.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }

    /// Returns every declaration with its role, in declaration order:
    /// masters, then workers, then load balancers.
    pub fn declarations(&self) -> impl Iterator<Item = (NodeRole, &NodeDeclaration)> {
        self.nodes
            .masters
            .iter()
            .map(|n| (NodeRole::Master, n))
            .chain(self.nodes.workers.iter().map(|n| (NodeRole::Worker, n)))
            .chain(self.nodes.haproxy.iter().map(|n| (NodeRole::LoadBalancer, n)))
    }

    /// Returns the configured virtual IP, preferring `virtual_ip` over `api_vip`.
    #[must_use]
    pub fn configured_virtual_ip(&self) -> Option<&str> {
        self.network
            .virtual_ip
            .as_deref()
            .or(self.network.api_vip.as_deref())
    }
}

impl NodesConfig {
    /// Returns the declarations of one role.
    #[must_use]
    pub fn by_role(&self, role: NodeRole) -> &[NodeDeclaration] {
        match role {
            NodeRole::Master => &self.masters,
            NodeRole::Worker => &self.workers,
            NodeRole::LoadBalancer => &self.haproxy,
        }
    }

    /// Returns the total number of declared nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.masters.len() + self.workers.len() + self.haproxy.len()
    }

    /// Returns true if no node is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeDeclaration {
    /// Creates a declaration with a static address.
    #[must_use]
    pub fn new(hostname: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip: Some(ip.into()),
            keepalived_priority: None,
            keepalived_state: None,
        }
    }

    /// Creates a declaration without an address.
    #[must_use]
    pub fn unaddressed(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip: None,
            keepalived_priority: None,
            keepalived_state: None,
        }
    }

    /// Sets the failover metadata.
    #[must_use]
    pub const fn with_failover(mut self, priority: u32, state: FailoverState) -> Self {
        self.keepalived_priority = Some(priority);
        self.keepalived_state = Some(state);
        self
    }
}

impl NodeRole {
    /// Returns the role name as written in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Worker => "worker",
            Self::LoadBalancer => "loadbalancer",
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailoverState {
    /// Returns the state as keepalived spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Master => "MASTER",
            Self::Backup => "BACKUP",
        }
    }
}

impl ServicesConfig {
    /// Whether helm is deployed.
    #[must_use]
    pub fn helm(&self) -> bool {
        self.deploy_helm.or(self.helm_enabled).unwrap_or(true)
    }

    /// Whether metrics-server is deployed.
    #[must_use]
    pub fn metrics_server(&self) -> bool {
        self.deploy_metrics_server
            .or(self.metrics_server_enabled)
            .unwrap_or(true)
    }

    /// Whether ingress-nginx is deployed.
    #[must_use]
    pub fn ingress(&self) -> bool {
        self.deploy_ingress.or(self.ingress_enabled).unwrap_or(true)
    }

    /// Whether the dashboard is deployed.
    #[must_use]
    pub fn dashboard(&self) -> bool {
        self.deploy_dashboard.or(self.dashboard_enabled).unwrap_or(true)
    }

    /// Whether RBAC is enabled.
    #[must_use]
    pub fn rbac(&self) -> bool {
        self.deploy_rbac.unwrap_or(true)
    }
}

impl PreflightErrors {
    /// Normalizes to a list, splitting and trimming a comma-separated string.
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Csv(s) => s
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

impl RegistryConfig {
    /// Returns the mirrors to emit, empty unless the block is enabled.
    #[must_use]
    pub fn active_mirrors(&self) -> &[String] {
        if self.enabled { &self.mirrors } else { &[] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_flag_precedence() {
        let services = ServicesConfig {
            deploy_helm: Some(false),
            helm_enabled: Some(true),
            ingress_enabled: Some(false),
            ..ServicesConfig::default()
        };
        assert!(!services.helm());
        assert!(!services.ingress());
        assert!(services.dashboard());
        assert!(services.metrics_server());
        assert!(services.rbac());
    }

    #[test]
    fn test_preflight_csv_normalization() {
        let errors = PreflightErrors::Csv(String::from("Swap, FileContent"));
        assert_eq!(errors.to_list(), vec!["Swap", "FileContent"]);
    }

    #[test]
    fn test_declarations_order() {
        let mut config = EnvironmentConfig::default();
        config.nodes.workers.push(NodeDeclaration::new("w1", "10.0.0.2"));
        config.nodes.haproxy.push(NodeDeclaration::new("h1", "10.0.0.3"));
        config.nodes.masters.push(NodeDeclaration::new("m1", "10.0.0.1"));

        let names: Vec<_> = config.declarations().map(|(_, n)| n.hostname.as_str()).collect();
        assert_eq!(names, vec!["m1", "w1", "h1"]);
    }

    #[test]
    fn test_environment_title() {
        let config = EnvironmentConfig {
            environment: String::from("lab"),
            ..EnvironmentConfig::default()
        };
        assert_eq!(config.environment_title(), "Lab");
        assert_eq!(config.cluster_name(), "k8s-lab");
        assert_eq!(config.dns_domain(), "lab.local");
    }

    #[test]
    fn test_virtual_ip_prefers_primary_key() {
        let mut config = EnvironmentConfig::default();
        config.network.api_vip = Some(String::from("10.0.0.9"));
        assert_eq!(config.configured_virtual_ip(), Some("10.0.0.9"));
        config.network.virtual_ip = Some(String::from("10.0.0.10"));
        assert_eq!(config.configured_virtual_ip(), Some("10.0.0.10"));
    }
}
