//! Address discovery capability.
//!
//! Discovery supplies the highest-precedence addresses to the resolver. The
//! default [`StaticDiscovery`] returns nothing, so declared addresses win;
//! [`TableDiscovery`] injects an explicit override table. A live
//! implementation only has to implement [`AddressDiscovery`].

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::config::EnvironmentConfig;
use crate::error::{AddressResolutionError, InventoryError, Result};

/// Hostname to address mapping produced by discovery.
///
/// The reserved key `virtual_ip` overrides the configured virtual IP.
pub type DiscoveryTable = BTreeMap<String, String>;

/// Key under which discovery may supply the virtual IP.
pub const VIRTUAL_IP_KEY: &str = "virtual_ip";

/// A source of live node addresses.
#[cfg_attr(test, mockall::automock)]
pub trait AddressDiscovery {
    /// Returns the addresses known for the environment's hosts.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery itself fails.
    fn discover(&self, config: &EnvironmentConfig) -> Result<DiscoveryTable>;
}

/// Discovery that defers entirely to the static configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticDiscovery;

impl StaticDiscovery {
    /// Creates a static discovery.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AddressDiscovery for StaticDiscovery {
    fn discover(&self, config: &EnvironmentConfig) -> Result<DiscoveryTable> {
        info!(
            "Using static IP configuration for environment '{}'",
            config.environment
        );
        Ok(DiscoveryTable::new())
    }
}

/// Discovery backed by an explicit override table.
#[derive(Debug, Default, Clone)]
pub struct TableDiscovery {
    table: DiscoveryTable,
}

impl TableDiscovery {
    /// Creates a discovery from an existing table.
    #[must_use]
    pub const fn new(table: DiscoveryTable) -> Self {
        Self { table }
    }

    /// Loads an override table from a YAML mapping of hostname to address.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a flat mapping.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading discovered addresses from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let table: DiscoveryTable = serde_yaml::from_str(&content).map_err(|e| {
            InventoryError::Address(AddressResolutionError::DiscoveryFailed {
                message: format!("{}: {e}", path.display()),
            })
        })?;

        debug!("Loaded {} discovered addresses", table.len());
        Ok(Self { table })
    }
}

impl AddressDiscovery for TableDiscovery {
    fn discover(&self, _config: &EnvironmentConfig) -> Result<DiscoveryTable> {
        Ok(self.table.clone())
    }
}

impl FromIterator<(String, String)> for TableDiscovery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            table: iter.into_iter().collect(),
        }
    }
}
