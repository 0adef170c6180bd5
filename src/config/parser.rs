//! Configuration parser for loading environment descriptions.
//!
//! This module handles loading `Environments/<env>/vars.yml` from a project
//! root, environment variable overrides, and `.env` files. Loading is the
//! only place a configuration is modified; the compiler treats the result as
//! immutable.

use crate::error::{ConfigError, InventoryError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::EnvironmentConfig;

/// Directory under the project root holding one folder per environment.
pub const ENVIRONMENTS_DIR: &str = "Environments";

/// Name of the per-environment configuration file.
pub const VARS_FILE: &str = "vars.yml";

/// Configuration parser for loading environment configuration.
#[derive(Debug, Clone)]
pub struct ConfigParser {
    /// Project root that contains the `Environments` directory.
    root: PathBuf,
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ConfigParser {
    /// Creates a new configuration parser rooted at a project directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the path of an environment's `vars.yml`.
    #[must_use]
    pub fn environment_file(&self, environment: &str) -> PathBuf {
        self.root
            .join(ENVIRONMENTS_DIR)
            .join(environment.to_lowercase())
            .join(VARS_FILE)
    }

    /// Loads an environment's configuration with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be read, or is invalid.
    pub fn load_environment(&self, environment: &str) -> Result<EnvironmentConfig> {
        let path = self.environment_file(environment);
        let mut config = self.load_file(&path, environment)?;

        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>, environment: &str) -> Result<EnvironmentConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(InventoryError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            InventoryError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, environment, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// An empty document yields the all-defaults configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(
        &self,
        content: &str,
        environment: &str,
        source: Option<&Path>,
    ) -> Result<EnvironmentConfig> {
        debug!("Parsing YAML configuration");

        let mut config: EnvironmentConfig = if content.trim().is_empty() {
            EnvironmentConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                let location = source.map(|p| p.display().to_string());
                InventoryError::Config(ConfigError::ParseError {
                    message: format!("YAML parse error: {e}"),
                    location,
                })
            })?
        };
        config.environment = environment.to_lowercase();

        debug!(
            "Parsed configuration for environment '{}' with {} nodes",
            config.environment,
            config.nodes.len()
        );
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(config: &mut EnvironmentConfig) {
        if let Ok(name) = std::env::var("INVGEN_CLUSTER_NAME") {
            debug!("Overriding cluster.name from environment");
            config.cluster.name = Some(name);
        }

        if let Ok(user) = std::env::var("INVGEN_ANSIBLE_USER") {
            debug!("Overriding ansible.user from environment");
            config.ansible.user = user;
        }

        if let Ok(key) = std::env::var("INVGEN_SSH_PRIVATE_KEY_FILE") {
            debug!("Overriding ansible.ssh_private_key_file from environment");
            config.ansible.ssh_private_key_file = key;
        }

        if let Ok(vip) = std::env::var("INVGEN_VIRTUAL_IP") {
            debug!("Overriding network.virtual_ip from environment");
            config.network.virtual_ip = Some(vip);
        }
    }

    /// Loads the .env file from the project root if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self.root.join(".env");

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                InventoryError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FailoverState, PreflightErrors};
    use tempfile::TempDir;

    const LAB_VARS: &str = r#"
cluster:
  name: lab-cluster
nodes:
  masters:
    - hostname: m1
      ip: 192.168.56.153
  workers:
    - hostname: w1
      ip: 192.168.56.163
  haproxy:
    - hostname: h1
      ip: 192.168.56.151
      keepalived_priority: 110
      keepalived_state: MASTER
    - hostname: h2
      ip: 192.168.56.152
      keepalived_priority: 100
      keepalived_state: BACKUP
network:
  prefix: "192.168.56"
  api_vip: 192.168.56.150
  dns_servers:
    - 8.8.8.8
services:
  helm_enabled: false
kubeadm_ignore_preflight_errors: "Swap,FileContent"
"#;

    #[test]
    fn test_parse_minimal_config() {
        let parser = ConfigParser::default();
        let config = parser.parse_yaml("", "Lab", None).unwrap();

        assert_eq!(config.environment, "lab");
        assert_eq!(config.network.prefix, "192.168.56");
        assert_eq!(config.network.service_cidr, "10.233.0.0/18");
        assert_eq!(config.ansible.user, "root");
        assert_eq!(config.cluster.bootstrap_os, "ubuntu");
        assert!(config.nodes.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let parser = ConfigParser::default();
        let config = parser.parse_yaml(LAB_VARS, "lab", None).unwrap();

        assert_eq!(config.cluster_name(), "lab-cluster");
        assert_eq!(config.nodes.masters.len(), 1);
        assert_eq!(config.nodes.haproxy.len(), 2);
        assert_eq!(
            config.nodes.haproxy[1].keepalived_state,
            Some(FailoverState::Backup)
        );
        assert_eq!(config.configured_virtual_ip(), Some("192.168.56.150"));
        assert!(!config.services.helm());
        assert_eq!(
            config.kubeadm_ignore_preflight_errors,
            Some(PreflightErrors::Csv(String::from("Swap,FileContent")))
        );
    }

    #[test]
    fn test_parse_preflight_list_and_interface() {
        let yaml = r"
network:
  interface_config:
    force_cluster_network: false
kubeadm_ignore_preflight_errors:
  - Swap
  - NumCPU
";
        let config = ConfigParser::default().parse_yaml(yaml, "lab", None).unwrap();
        let errors = config.kubeadm_ignore_preflight_errors.unwrap();
        assert_eq!(
            errors,
            PreflightErrors::List(vec![String::from("Swap"), String::from("NumCPU")])
        );
        assert_eq!(errors.to_list(), vec!["Swap", "NumCPU"]);
        assert!(!config.network.interface_config.force_cluster_network);
        assert_eq!(config.network.interface_config.cluster_interface, "enp0s8");
    }

    #[test]
    fn test_loadbalancers_alias() {
        let yaml = r"
nodes:
  loadbalancers:
    - hostname: lb1
";
        let config = ConfigParser::default().parse_yaml(yaml, "dev", None).unwrap();
        assert_eq!(config.nodes.haproxy.len(), 1);
        assert!(config.nodes.haproxy[0].ip.is_none());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = ConfigParser::default().parse_yaml("nodes: [", "lab", None);
        assert!(matches!(
            result,
            Err(InventoryError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_load_environment_from_root() {
        let root = TempDir::new().expect("Failed to create temp dir");
        let parser = ConfigParser::new(root.path());
        let path = parser.environment_file("Lab");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, LAB_VARS).unwrap();

        let config = parser.load_file(&path, "Lab").unwrap();
        assert_eq!(config.environment, "lab");
        assert!(path.ends_with("Environments/lab/vars.yml"));
    }

    #[test]
    fn test_missing_environment_file() {
        let root = TempDir::new().expect("Failed to create temp dir");
        let result = ConfigParser::new(root.path()).load_environment("prod");
        assert!(matches!(
            result,
            Err(InventoryError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
