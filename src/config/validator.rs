//! Structural validation for environment configurations.
//!
//! This module checks a freshly loaded configuration for authoring mistakes
//! that do not need resolved addresses: malformed fields, repeated
//! hostnames, and suspicious but legal settings (reported as warnings).
//! Network invariants are enforced later, against resolved addresses.

use crate::error::{ConfigError, InventoryError, Result};
use std::collections::HashSet;
use tracing::debug;
use ::validator::{Validate, ValidationErrors};

use super::spec::{EnvironmentConfig, NodeRole};

/// Validator for environment configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates an environment configuration.
    ///
    /// # Errors
    ///
    /// Returns the first error found; a repeated hostname is reported as
    /// `DuplicateName`, everything else as `ValidationError`.
    pub fn validate(&self, config: &EnvironmentConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        if let Err(errors) = config.validate() {
            Self::collect_field_errors("", &errors, &mut result);
        }
        Self::validate_environment(config, &mut result);
        Self::validate_hostnames(config, &mut result)?;
        Self::validate_optional_blocks(config, &mut result);
        Self::collect_warnings(config, &mut result);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(InventoryError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )))
        }
    }

    /// Flattens `validator` errors into dotted field paths.
    fn collect_field_errors(prefix: &str, errors: &ValidationErrors, result: &mut ValidationResult) {
        use ::validator::ValidationErrorsKind;

        for (field, kind) in errors.errors() {
            let path = if prefix.is_empty() {
                field.to_string()
            } else {
                format!("{prefix}.{field}")
            };
            match kind {
                ValidationErrorsKind::Field(field_errors) => {
                    for error in field_errors {
                        let message = error
                            .message
                            .as_ref()
                            .map_or_else(|| format!("invalid value ({})", error.code), ToString::to_string);
                        result.errors.push(ValidationError {
                            field: path.clone(),
                            message,
                        });
                    }
                }
                ValidationErrorsKind::Struct(inner) => {
                    Self::collect_field_errors(&path, inner, result);
                }
                ValidationErrorsKind::List(items) => {
                    for (index, inner) in items {
                        Self::collect_field_errors(&format!("{path}[{index}]"), inner, result);
                    }
                }
            }
        }
    }

    /// Validates the environment name.
    fn validate_environment(config: &EnvironmentConfig, result: &mut ValidationResult) {
        if config.environment.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("environment"),
                message: String::from("Environment name cannot be empty"),
            });
        } else if !is_valid_name(&config.environment) {
            result.errors.push(ValidationError {
                field: String::from("environment"),
                message: format!(
                    "Environment name '{}' is invalid. Must be lowercase alphanumeric with hyphens.",
                    config.environment
                ),
            });
        }
    }

    /// Rejects hostnames declared more than once, across all roles.
    fn validate_hostnames(config: &EnvironmentConfig, result: &mut ValidationResult) -> Result<()> {
        let mut seen = HashSet::new();
        for (role, node) in config.declarations() {
            if !seen.insert(node.hostname.as_str()) {
                return Err(InventoryError::Config(ConfigError::DuplicateName {
                    resource_type: String::from("node"),
                    name: node.hostname.clone(),
                }));
            }
            if role != NodeRole::LoadBalancer
                && (node.keepalived_priority.is_some() || node.keepalived_state.is_some())
            {
                result.warnings.push(format!(
                    "{role} '{}': keepalived settings only apply to load-balancer nodes",
                    node.hostname
                ));
            }
        }
        Ok(())
    }

    /// Validates optional blocks that are only meaningful when complete.
    fn validate_optional_blocks(config: &EnvironmentConfig, result: &mut ValidationResult) {
        if let Some(oidc) = config.oidc.as_ref().filter(|o| o.enabled) {
            if oidc.issuer_url.is_empty() {
                result.errors.push(ValidationError {
                    field: String::from("oidc.issuer_url"),
                    message: String::from("OIDC is enabled but no issuer_url is set"),
                });
            }
            if oidc.client_id.is_empty() {
                result.errors.push(ValidationError {
                    field: String::from("oidc.client_id"),
                    message: String::from("OIDC is enabled but no client_id is set"),
                });
            }
        }

        if let Some(registry) = &config.registry {
            if registry.enabled && registry.mirrors.is_empty() {
                result
                    .warnings
                    .push(String::from("registry.enabled is set but no mirrors are listed"));
            }
        }
    }

    /// Collects non-fatal observations.
    fn collect_warnings(config: &EnvironmentConfig, result: &mut ValidationResult) {
        if config.nodes.masters.is_empty() {
            result.warnings.push(String::from("No master nodes declared"));
        }

        if config.nodes.haproxy.len() > 2 {
            result.warnings.push(format!(
                "{} load-balancer nodes declared; only the first two form the failover pair",
                config.nodes.haproxy.len()
            ));
        }

        for (role, node) in config.declarations() {
            if node.ip.is_none() {
                result.warnings.push(format!(
                    "{role} '{}' has no ip; it must be discovered or computed",
                    node.hostname
                ));
            }
        }

        if config.configured_virtual_ip().is_none() {
            result
                .warnings
                .push(String::from("No network.virtual_ip configured; it must be discovered"));
        }
    }
}

/// Validates that a name follows the naming convention.
/// Names must be lowercase alphanumeric with hyphens, starting with a letter.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }

    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return false;
    }

    !name.ends_with('-') && !name.contains("--")
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NodeDeclaration, OidcConfig, RegistryConfig};

    fn valid_config() -> EnvironmentConfig {
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

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("lab"));
        assert!(is_valid_name("prod-eu1"));
    }

    #[test]
    fn test_invalid_name() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Lab"));
        assert!(!is_valid_name("1lab"));
        assert!(!is_valid_name("lab-"));
        assert!(!is_valid_name("lab--eu"));
    }

    #[test]
    fn test_valid_config_passes() {
        let result = ConfigValidator::new().validate(&valid_config()).unwrap();
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_malformed_ip_rejected() {
        let mut config = valid_config();
        config.nodes.workers.push(NodeDeclaration::new("w1", "192.168.56.999"));

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        match err {
            InventoryError::Config(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field.as_deref(), Some("nodes.workers[0].ip"));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_hostname_across_roles() {
        let mut config = valid_config();
        config.nodes.workers.push(NodeDeclaration::new("h1", "192.168.56.170"));

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Config(ConfigError::DuplicateName { ref name, .. }) if name == "h1"
        ));
    }

    #[test]
    fn test_oidc_requires_issuer() {
        let mut config = valid_config();
        config.oidc = Some(OidcConfig {
            enabled: true,
            client_id: String::from("kubernetes"),
            ..OidcConfig::default()
        });
        assert!(ConfigValidator::new().validate(&config).is_err());
    }

    #[test]
    fn test_warnings_collected() {
        let mut config = valid_config();
        config.nodes.workers.push(NodeDeclaration::unaddressed("w1"));
        config.registry = Some(RegistryConfig {
            enabled: true,
            mirrors: Vec::new(),
        });

        let result = ConfigValidator::new().validate(&config).unwrap();
        assert_eq!(result.warnings.len(), 2);
    }
}
