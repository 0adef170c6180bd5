//! Inventory module for the inventory compiler.
//!
//! This module renders the resolved address table into text artifacts:
//! - The Ansible INI emitter
//! - The Kubespray inventory and group vars
//! - The HAProxy/keepalived inventory
//! - Post-generation verification of the complete artifact set

mod artifact;
mod ini;
mod loadbalancer;
mod orchestration;
mod verifier;

pub use artifact::{ArtifactKind, ArtifactSet, InventoryArtifact};
pub use ini::IniDocument;
pub use loadbalancer::LoadBalancerBuilder;
pub use orchestration::{
    APISERVER_PORT, ETCD_CLIENT_PORT, OrchestrationArtifacts, OrchestrationBuilder,
};
pub use verifier::ArtifactVerifier;
