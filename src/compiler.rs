//! Compiler facade driving one inventory compilation.
//!
//! This module runs the full pipeline for a loaded configuration:
//! discovery, address resolution, network validation, both builders, and
//! verification. Any failure aborts the run with the first error, and no
//! artifact is handed out unless all four verified.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{ConfigHasher, EnvironmentConfig};
use crate::error::Result;
use crate::inventory::{
    ArtifactSet, ArtifactVerifier, LoadBalancerBuilder, OrchestrationBuilder,
};
use crate::network::{
    AddressDiscovery, AddressResolver, NetworkValidator, ResolvedAddress, ResolvedAddressTable,
    StaticDiscovery,
};

/// Drives discovery, resolution, validation, generation and verification.
pub struct InventoryCompiler<D: AddressDiscovery = StaticDiscovery> {
    /// Address discovery capability.
    discovery: D,
    /// Address resolver.
    resolver: AddressResolver,
    /// Network invariant validator.
    validator: NetworkValidator,
    /// Artifact verifier.
    verifier: ArtifactVerifier,
    /// Configuration hasher.
    hasher: ConfigHasher,
}

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompilationOutput {
    /// The four verified artifacts.
    pub artifacts: ArtifactSet,
    /// The addresses the artifacts were built from.
    pub table: ResolvedAddressTable,
    /// Fingerprint of the configuration and resolved addresses.
    pub fingerprint: String,
}

/// Which pipeline a run executed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompilationMode {
    /// Resolution and validation only.
    Check,
    /// Full generation.
    Generate,
}

/// Summary of a run, for display.
#[derive(Debug, Clone, Serialize)]
pub struct CompilationReport {
    /// Environment name.
    pub environment: String,
    /// Cluster name.
    pub cluster_name: String,
    /// Pipeline executed.
    pub mode: CompilationMode,
    /// Short fingerprint, present after generation.
    pub fingerprint: Option<String>,
    /// Resolved virtual IP.
    pub virtual_ip: Option<String>,
    /// Resolved nodes in declaration order.
    pub nodes: Vec<ResolvedAddress>,
    /// Files written.
    pub written: Vec<PathBuf>,
    /// Non-fatal configuration warnings.
    pub warnings: Vec<String>,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
}

impl InventoryCompiler<StaticDiscovery> {
    /// Creates a compiler that uses only the static configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_discovery(StaticDiscovery::new())
    }
}

impl Default for InventoryCompiler<StaticDiscovery> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: AddressDiscovery> InventoryCompiler<D> {
    /// Creates a compiler with a discovery capability.
    #[must_use]
    pub fn with_discovery(discovery: D) -> Self {
        Self {
            discovery,
            resolver: AddressResolver::new(),
            validator: NetworkValidator::new(),
            verifier: ArtifactVerifier::new(),
            hasher: ConfigHasher::new(),
        }
    }

    /// Replaces the address resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: AddressResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Resolves and validates addresses without generating anything.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery, resolution or validation fails.
    pub fn check(&self, config: &EnvironmentConfig) -> Result<ResolvedAddressTable> {
        info!("Checking environment '{}'", config.environment);

        let discovered = self.discovery.discover(config)?;
        debug!("Discovery returned {} entries", discovered.len());

        let table = self.resolver.resolve(config, &discovered)?;
        info!("Resolved {} node addresses", table.len());

        self.validator.validate(config, &table)?;
        info!("Network configuration is valid");

        Ok(table)
    }

    /// Runs the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any stage.
    pub fn compile(&self, config: &EnvironmentConfig) -> Result<CompilationOutput> {
        let table = self.check(config)?;

        let fingerprint = self.hasher.fingerprint(config, &table);
        let stamp = self.hasher.short_hash(&fingerprint);
        debug!("Compilation fingerprint: {}", stamp);

        let mut artifacts = ArtifactSet::new();
        artifacts.extend(OrchestrationBuilder::new(stamp.as_str()).build(config, &table)?);
        artifacts.insert(LoadBalancerBuilder::new(stamp.as_str()).build(config, &table)?);

        self.verifier.verify(&artifacts)?;
        info!(
            "Generated {} artifacts for '{}'",
            artifacts.len(),
            config.environment
        );

        Ok(CompilationOutput {
            artifacts,
            table,
            fingerprint,
        })
    }
}

impl CompilationReport {
    /// Creates a report for a run over a resolved table.
    #[must_use]
    pub fn new(
        config: &EnvironmentConfig,
        mode: CompilationMode,
        table: &ResolvedAddressTable,
    ) -> Self {
        Self {
            environment: config.environment.clone(),
            cluster_name: config.cluster_name(),
            mode,
            fingerprint: None,
            virtual_ip: table.virtual_ip().map(String::from),
            nodes: table.entries().to_vec(),
            written: Vec::new(),
            warnings: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Sets the fingerprint, shortened for display.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: &str) -> Self {
        self.fingerprint = Some(ConfigHasher::new().short_hash(fingerprint));
        self
    }

    /// Sets the written paths.
    #[must_use]
    pub fn with_written(mut self, written: Vec<PathBuf>) -> Self {
        self.written = written;
        self
    }

    /// Sets the configuration warnings.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeDeclaration;
    use crate::error::{BuildError, InventoryError, NetworkConflictError};
    use crate::inventory::ArtifactKind;
    use crate::network::{AddressSource, DiscoveryTable, MockAddressDiscovery, TableDiscovery};

    fn lab_config() -> EnvironmentConfig {
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
    fn test_compile_produces_all_artifacts() {
        let output = InventoryCompiler::new().compile(&lab_config()).unwrap();

        assert_eq!(output.artifacts.len(), 4);
        assert_eq!(output.table.len(), 4);
        assert_eq!(output.fingerprint.len(), 64);
        for kind in ArtifactKind::ALL {
            assert!(output.artifacts.get(kind).is_some(), "missing {kind}");
        }

        let stamp = ConfigHasher::new().short_hash(&output.fingerprint);
        let inventory = output
            .artifacts
            .content(ArtifactKind::OrchestrationInventory)
            .unwrap();
        assert!(inventory.contains(&format!("# Fingerprint: {stamp}\n")));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let config = lab_config();
        let compiler = InventoryCompiler::new();

        let first = compiler.compile(&config).unwrap();
        let second = compiler.compile(&config).unwrap();
        assert_eq!(first.artifacts, second.artifacts);
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn test_single_load_balancer_rejected() {
        let mut config = lab_config();
        config.nodes.haproxy.truncate(1);

        let err = InventoryCompiler::new().compile(&config).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Network(NetworkConflictError::InsufficientLoadBalancers { found: 1 })
        ));
    }

    #[test]
    fn test_cidr_overlap_stops_before_generation() {
        let mut config = lab_config();
        config.network.service_cidr = String::from("192.168.56.0/18");

        let err = InventoryCompiler::new().compile(&config).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Network(NetworkConflictError::CidrOverlap { .. })
        ));
    }

    #[test]
    fn test_discovery_takes_precedence() {
        let mut discovery = MockAddressDiscovery::new();
        discovery.expect_discover().times(1).returning(|_| {
            let mut table = DiscoveryTable::new();
            table.insert(String::from("w1"), String::from("192.168.56.170"));
            Ok(table)
        });

        let output = InventoryCompiler::with_discovery(discovery)
            .compile(&lab_config())
            .unwrap();

        let w1 = output.table.get("w1").unwrap();
        assert_eq!(w1.ip, "192.168.56.170");
        assert_eq!(w1.source, AddressSource::Discovered);
        assert!(output
            .artifacts
            .content(ArtifactKind::OrchestrationInventory)
            .unwrap()
            .contains("ip=192.168.56.170 access_ip=192.168.56.170"));
    }

    #[test]
    fn test_discovered_virtual_ip_overrides_config() {
        let discovery: TableDiscovery =
            [(String::from("virtual_ip"), String::from("192.168.56.149"))]
                .into_iter()
                .collect();

        let output = InventoryCompiler::with_discovery(discovery)
            .compile(&lab_config())
            .unwrap();
        assert_eq!(output.table.virtual_ip(), Some("192.168.56.149"));
    }

    #[test]
    fn test_missing_virtual_ip_fails_build() {
        let mut config = lab_config();
        config.network.virtual_ip = None;

        let err = InventoryCompiler::new().compile(&config).unwrap_err();
        assert!(matches!(err, InventoryError::Build(BuildError::MissingVirtualIp)));
    }

    #[test]
    fn test_check_runs_without_generation() {
        let mut config = lab_config();
        config.network.virtual_ip = None;

        let table = InventoryCompiler::new().check(&config).unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.virtual_ip().is_none());
    }

    #[test]
    fn test_strict_resolver_refuses_computed_addresses() {
        let mut config = lab_config();
        config.nodes.workers.push(NodeDeclaration::unaddressed("w2"));

        let lenient = InventoryCompiler::new().check(&config).unwrap();
        assert_eq!(lenient.ip("w2"), Some("192.168.56.164"));

        let err = InventoryCompiler::new()
            .with_resolver(AddressResolver::strict())
            .check(&config)
            .unwrap_err();
        assert!(matches!(err, InventoryError::Address(_)));
    }

    #[test]
    fn test_report_from_table() {
        let config = lab_config();
        let output = InventoryCompiler::new().compile(&config).unwrap();

        let report = CompilationReport::new(&config, CompilationMode::Generate, &output.table)
            .with_fingerprint(&output.fingerprint);
        assert_eq!(report.nodes.len(), 4);
        assert_eq!(report.fingerprint.as_deref().map(str::len), Some(12));
        assert_eq!(report.virtual_ip.as_deref(), Some("192.168.56.150"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "generate");
        assert_eq!(json["nodes"][0]["source"], "declared");
    }
}
