//! Error types for the inventory compiler.
//!
//! This module provides one error enum per pipeline stage: configuration
//! loading, address resolution, network validation, artifact generation, and
//! post-generation verification. [`InventoryError`] wraps them all.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the inventory compiler.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Address resolution errors.
    #[error("Address resolution error: {0}")]
    Address(#[from] AddressResolutionError),

    /// Network invariant violations.
    #[error("Network conflict: {0}")]
    Network(#[from] NetworkConflictError),

    /// Artifact generation errors.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Post-generation verification errors.
    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Structural validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// The same hostname is declared more than once.
    #[error("Duplicate {resource_type} name: {name}")]
    DuplicateName {
        /// Type of resource (node, mirror, ...).
        resource_type: String,
        /// The duplicated name.
        name: String,
    },
}

/// Errors raised while turning declarations into concrete addresses.
#[derive(Debug, Error)]
pub enum AddressResolutionError {
    /// No lookup strategy produced an address for a required host.
    #[error("No address could be resolved for host '{hostname}'")]
    MissingAddress {
        /// Hostname without an address.
        hostname: String,
    },

    /// The discovery capability failed.
    #[error("Address discovery failed: {message}")]
    DiscoveryFailed {
        /// Description of the discovery failure.
        message: String,
    },
}

/// Network invariant violations found in a resolved address set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkConflictError {
    /// One or more addresses are assigned to more than one host.
    #[error("Duplicate IP addresses found: {}", .ips.join(", "))]
    DuplicateAddress {
        /// Every address that appears more than once.
        ips: Vec<String>,
    },

    /// A virtual address equals a node address or another virtual address.
    #[error("Virtual IPs {} conflict with node or virtual IPs", .ips.join(", "))]
    VirtualIpCollision {
        /// Every colliding virtual address.
        ips: Vec<String>,
    },

    /// A cluster-internal CIDR shares the host network prefix.
    #[error("Kubernetes networks {} conflict with host network {}.x", .cidrs.join(", "), .prefix)]
    CidrOverlap {
        /// Every offending CIDR.
        cidrs: Vec<String>,
        /// The host network prefix it overlaps.
        prefix: String,
    },

    /// Fewer than two load-balancer nodes are declared.
    #[error("At least 2 load-balancer nodes are required, found {found}")]
    InsufficientLoadBalancers {
        /// Number of declared load-balancer nodes.
        found: usize,
    },
}

/// Artifact generation errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No virtual IP is resolvable from configuration or discovery.
    #[error("No virtual IP configured (set network.virtual_ip or network.api_vip)")]
    MissingVirtualIp,

    /// A declared host has no entry in the resolved address table.
    #[error("Host '{hostname}' is missing from the resolved address table")]
    UnknownHost {
        /// The unresolved hostname.
        hostname: String,
    },

    /// Generic generation failure.
    #[error("Failed to generate {artifact}: {message}")]
    Generation {
        /// Logical name of the artifact.
        artifact: String,
        /// Description of the failure.
        message: String,
    },
}

/// Post-generation verification failure.
#[derive(Debug, Error)]
#[error("Artifact '{artifact}' failed verification: {cause}")]
pub struct VerificationError {
    /// Logical name of the artifact.
    pub artifact: String,
    /// Why the artifact was rejected.
    pub cause: String,
}

/// Result type alias for inventory compiler operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

impl InventoryError {
    /// Returns the pipeline stage that raised this error.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "load",
            Self::Address(_) => "resolve",
            Self::Network(_) => "validate",
            Self::Build(_) => "build",
            Self::Verification(_) => "verify",
            Self::Io(_) => "io",
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl BuildError {
    /// Creates a generation error for the named artifact.
    #[must_use]
    pub fn generation(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            artifact: artifact.into(),
            message: message.into(),
        }
    }
}

impl VerificationError {
    /// Creates a verification error for the named artifact.
    #[must_use]
    pub fn new(artifact: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            cause: cause.into(),
        }
    }
}
