//! Network module for the inventory compiler.
//!
//! This module turns node declarations into concrete addresses and checks
//! them against the network invariants:
//! - Pluggable address discovery
//! - Ordered address resolution strategies
//! - The resolved address table shared by every builder
//! - Invariant validation (duplicates, virtual IP, CIDRs, load balancers)

mod discovery;
mod resolver;
mod table;
mod validator;

pub use discovery::{
    AddressDiscovery, DiscoveryTable, StaticDiscovery, TableDiscovery, VIRTUAL_IP_KEY,
};
#[cfg(test)]
pub use discovery::MockAddressDiscovery;
pub use resolver::{
    AddressResolver, ComputedDefaultLookup, DeclaredLookup, DiscoveredLookup, LookupContext,
    LookupStrategy,
};
pub use table::{AddressSource, ResolvedAddress, ResolvedAddressTable};
pub use validator::{MIN_LOAD_BALANCERS, NetworkValidator};
