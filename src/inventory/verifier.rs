//! Post-generation verification of artifact sets.

use tracing::debug;

use super::artifact::{ArtifactKind, ArtifactSet};
use crate::error::{Result, VerificationError};

/// Verifier that checks a complete artifact set before it is written.
#[derive(Debug, Default)]
pub struct ArtifactVerifier;

impl ArtifactVerifier {
    /// Creates a new verifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Verifies that every artifact kind is present and well-formed.
    ///
    /// # Errors
    ///
    /// Returns a `VerificationError` naming the first failing artifact.
    pub fn verify(&self, artifacts: &ArtifactSet) -> Result<()> {
        for kind in ArtifactKind::ALL {
            let content = artifacts
                .content(kind)
                .ok_or_else(|| VerificationError::new(kind.name(), "artifact was not generated"))?;

            if content.trim().is_empty() {
                return Err(VerificationError::new(kind.name(), "artifact is empty").into());
            }

            let checked = if kind.is_structured() {
                check_yaml(content)
            } else {
                check_ini(content)
            };
            checked.map_err(|cause| VerificationError::new(kind.name(), cause))?;
            debug!("Verified {}", kind);
        }
        Ok(())
    }
}

/// A settings document must parse into a mapping.
fn check_yaml(content: &str) -> std::result::Result<(), String> {
    match serde_yaml::from_str::<serde_yaml::Value>(content) {
        Ok(serde_yaml::Value::Mapping(_)) => Ok(()),
        Ok(_) => Err(String::from("document is not a mapping")),
        Err(e) => Err(format!("invalid YAML: {e}")),
    }
}

/// Every bracketed line must be a well-formed section header, and there must
/// be at least one.
fn check_ini(content: &str) -> std::result::Result<(), String> {
    let mut sections = 0;
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if !line.starts_with('[') {
            continue;
        }
        let name = line
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .filter(|name| {
                !name.is_empty()
                    && !name
                        .chars()
                        .any(|c| c.is_whitespace() || c == '[' || c == ']')
            });
        if name.is_none() {
            return Err(format!("malformed section header on line {}: {line}", number + 1));
        }
        sections += 1;
    }

    if sections == 0 {
        return Err(String::from("no section headers"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InventoryError;
    use crate::inventory::InventoryArtifact;

    fn complete_set() -> ArtifactSet {
        let mut set = ArtifactSet::new();
        set.insert(InventoryArtifact::new(
            ArtifactKind::OrchestrationInventory,
            String::from("[all]\nm1 ip=10.0.0.1\n"),
        ));
        set.insert(InventoryArtifact::new(
            ArtifactKind::OrchestrationClusterVars,
            String::from("cluster_name: lab\n"),
        ));
        set.insert(InventoryArtifact::new(
            ArtifactKind::OrchestrationGlobalVars,
            String::from("bootstrap_os: ubuntu\n"),
        ));
        set.insert(InventoryArtifact::new(
            ArtifactKind::LoadBalancerInventory,
            String::from("[haproxy]\nh1\n\n[haproxy:vars]\nenv=lab\n"),
        ));
        set
    }

    fn failing_artifact(set: &ArtifactSet) -> String {
        match ArtifactVerifier::new().verify(set).unwrap_err() {
            InventoryError::Verification(e) => e.artifact,
            other => panic!("expected VerificationError, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_set_passes() {
        assert!(ArtifactVerifier::new().verify(&complete_set()).is_ok());
    }

    #[test]
    fn test_missing_artifact() {
        let mut set = ArtifactSet::new();
        set.insert(InventoryArtifact::new(
            ArtifactKind::OrchestrationInventory,
            String::from("[all]\n"),
        ));
        assert_eq!(failing_artifact(&set), "orchestration-cluster-vars");
    }

    #[test]
    fn test_empty_artifact() {
        let mut set = complete_set();
        set.insert(InventoryArtifact::new(
            ArtifactKind::OrchestrationGlobalVars,
            String::from("  \n"),
        ));
        assert_eq!(failing_artifact(&set), "orchestration-global-vars");
    }

    #[test]
    fn test_yaml_must_be_mapping() {
        let mut set = complete_set();
        set.insert(InventoryArtifact::new(
            ArtifactKind::OrchestrationClusterVars,
            String::from("- just\n- a list\n"),
        ));
        assert_eq!(failing_artifact(&set), "orchestration-cluster-vars");
    }

    #[test]
    fn test_malformed_section_header() {
        let mut set = complete_set();
        set.insert(InventoryArtifact::new(
            ArtifactKind::LoadBalancerInventory,
            String::from("[haproxy\nh1\n"),
        ));
        assert_eq!(failing_artifact(&set), "loadbalancer-inventory");
    }
}
