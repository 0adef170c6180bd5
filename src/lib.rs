// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # invgen
//!
//! Compiles one declarative environment description into the paired
//! inventories a Kubespray cluster behind an HAProxy/keepalived pair needs.
//!
//! ## Overview
//!
//! For a named environment, invgen:
//!
//! - Loads `Environments/<env>/vars.yml`
//! - Resolves every node to exactly one address (discovered, declared, or
//!   derived from the network prefix)
//! - Rejects duplicate addresses, virtual IP collisions, Kubernetes networks
//!   overlapping the host network, and a missing failover pair
//! - Renders the Kubespray inventory, its group vars, and the HAProxy
//!   inventory, then re-checks them before anything is written
//!
//! ## Pipeline
//!
//! 1. **Load**: [`config::ConfigParser`] and [`config::ConfigValidator`]
//! 2. **Resolve**: [`network::AddressResolver`] over an
//!    [`network::AddressDiscovery`] table
//! 3. **Validate**: [`network::NetworkValidator`]
//! 4. **Build**: [`inventory::OrchestrationBuilder`] and
//!    [`inventory::LoadBalancerBuilder`]
//! 5. **Verify**: [`inventory::ArtifactVerifier`]
//! 6. **Write**: [`writer::ArtifactWriter`]
//!
//! Steps 2 to 5 are driven by [`compiler::InventoryCompiler`].
//!
//! ## Modules
//!
//! - [`config`]: Configuration parsing and validation
//! - [`network`]: Address discovery, resolution and network invariants
//! - [`inventory`]: Artifact rendering and verification
//! - [`compiler`]: The compilation pipeline
//! - [`writer`]: Writing artifacts into the project layout
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! nodes:
//!   masters:
//!     - hostname: k8s-master-1
//!       ip: 192.168.56.153
//!   workers:
//!     - hostname: k8s-worker-1
//!       ip: 192.168.56.163
//!   haproxy:
//!     - hostname: haproxy-1
//!       ip: 192.168.56.151
//!     - hostname: haproxy-2
//!       ip: 192.168.56.152
//! network:
//!   prefix: "192.168.56"
//!   virtual_ip: 192.168.56.150
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod inventory;
pub mod network;
pub mod writer;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, OutputFormatter};
pub use compiler::{CompilationOutput, CompilationReport, InventoryCompiler};
pub use config::{ConfigHasher, ConfigParser, ConfigValidator, EnvironmentConfig};
pub use error::{InventoryError, Result};
pub use inventory::{ArtifactKind, ArtifactSet, ArtifactVerifier, InventoryArtifact};
pub use network::{AddressDiscovery, AddressResolver, NetworkValidator, ResolvedAddressTable};
pub use writer::ArtifactWriter;
