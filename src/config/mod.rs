//! Configuration module for the inventory compiler.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `Environments/<env>/vars.yml`
//! - Structural validation of configuration values
//! - Computing fingerprints for deterministic artifact headers

mod hash;
mod parser;
mod spec;
mod validator;

pub use hash::ConfigHasher;
pub use parser::{ConfigParser, ENVIRONMENTS_DIR, VARS_FILE};
pub use spec::{
    AnsibleConfig, ClusterConfig, EnvironmentConfig, FailoverState, HaproxyConfig, InterfaceConfig,
    NetworkConfig, NodeDeclaration, NodeRole, NodesConfig, OidcConfig, PreflightErrors,
    RegistryConfig, ServicesConfig,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
