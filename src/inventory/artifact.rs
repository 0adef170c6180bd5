//! Generated artifact types.

use serde::Serialize;
use std::path::PathBuf;

/// The four artifacts produced by one compilation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Kubespray host inventory (INI).
    OrchestrationInventory,
    /// Kubespray cluster-wide settings (YAML).
    OrchestrationClusterVars,
    /// Kubespray global settings (YAML).
    OrchestrationGlobalVars,
    /// HAProxy/keepalived host inventory (INI).
    LoadBalancerInventory,
}

impl ArtifactKind {
    /// Every kind, in generation order.
    pub const ALL: [Self; 4] = [
        Self::OrchestrationInventory,
        Self::OrchestrationClusterVars,
        Self::OrchestrationGlobalVars,
        Self::LoadBalancerInventory,
    ];

    /// Returns the logical artifact name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OrchestrationInventory => "orchestration-inventory",
            Self::OrchestrationClusterVars => "orchestration-cluster-vars",
            Self::OrchestrationGlobalVars => "orchestration-global-vars",
            Self::LoadBalancerInventory => "loadbalancer-inventory",
        }
    }

    /// Whether the artifact is a YAML document that must re-parse.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(
            self,
            Self::OrchestrationClusterVars | Self::OrchestrationGlobalVars
        )
    }

    /// Returns the conventional location relative to the project root.
    #[must_use]
    pub fn relative_path(self, environment: &str) -> PathBuf {
        let kubespray = PathBuf::from("Kubespray").join("inventory").join(environment);
        match self {
            Self::OrchestrationInventory => kubespray.join("inventory.ini"),
            Self::OrchestrationClusterVars => kubespray.join("group_vars").join("k8s_cluster.yml"),
            Self::OrchestrationGlobalVars => kubespray.join("group_vars").join("all.yml"),
            Self::LoadBalancerInventory => PathBuf::from("Ansible")
                .join("inventory")
                .join("haproxy_inventory.ini"),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One generated text payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InventoryArtifact {
    /// What the payload is.
    pub kind: ArtifactKind,
    /// Generated text.
    pub content: String,
}

impl InventoryArtifact {
    /// Creates an artifact.
    #[must_use]
    pub const fn new(kind: ArtifactKind, content: String) -> Self {
        Self { kind, content }
    }

    /// Returns the logical artifact name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// The artifacts of one compilation, at most one per kind.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: Vec<InventoryArtifact>,
}

impl ArtifactSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            artifacts: Vec::new(),
        }
    }

    /// Adds an artifact, replacing any earlier one of the same kind.
    pub fn insert(&mut self, artifact: InventoryArtifact) {
        self.artifacts.retain(|a| a.kind != artifact.kind);
        self.artifacts.push(artifact);
    }

    /// Returns the artifact of a kind.
    #[must_use]
    pub fn get(&self, kind: ArtifactKind) -> Option<&InventoryArtifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    /// Returns the content of an artifact kind.
    #[must_use]
    pub fn content(&self, kind: ArtifactKind) -> Option<&str> {
        self.get(kind).map(|a| a.content.as_str())
    }

    /// Iterates over the artifacts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &InventoryArtifact> {
        self.artifacts.iter()
    }

    /// Returns the number of artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl Extend<InventoryArtifact> for ArtifactSet {
    fn extend<I: IntoIterator<Item = InventoryArtifact>>(&mut self, iter: I) {
        for artifact in iter {
            self.insert(artifact);
        }
    }
}
