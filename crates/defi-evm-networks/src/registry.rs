//! Network registry
//!
//! A read-only table of [`NetworkConfig`] entries keyed by chain id. The
//! built-in table comes from [`crate::deployments`]; tests and embedders can
//! build their own with [`NetworkRegistry::new`].

use std::collections::BTreeMap;

use crate::config::{LendingMarkets, NetworkConfig};
use crate::deployments;
use crate::error::{NetworkError, NetworkResult};

/// Chain ids with a known block explorer or deployment
pub mod chain {
    pub const MAINNET: u64 = 1;
    pub const ROPSTEN: u64 = 3;
    pub const RINKEBY: u64 = 4;
    pub const GOERLI: u64 = 5;
    pub const KOVAN: u64 = 42;
    pub const BSC_TESTNET: u64 = 97;
}

/// Look up a chain id in the built-in table.
pub fn lookup(chain_id: u64) -> Option<&'static NetworkConfig> {
    deployments::ALL.iter().find(|config| config.chain_id == chain_id)
}

/// Immutable mapping from chain id to deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRegistry {
    entries: BTreeMap<u64, NetworkConfig>,
}

impl NetworkRegistry {
    /// Build a registry from explicit entries. A later entry for the same
    /// chain id replaces an earlier one.
    pub fn new(entries: impl IntoIterator<Item = NetworkConfig>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|config| (config.chain_id, config))
                .collect(),
        }
    }

    /// Registry holding the deployments compiled into this crate
    pub fn builtin() -> Self {
        Self::new(deployments::ALL)
    }

    /// Find the entry for a chain id, complete or not
    pub fn lookup(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.entries.get(&chain_id)
    }

    /// Look up a chain id and validate it is usable for a loan.
    pub fn resolve(&self, chain_id: u64) -> NetworkResult<LendingMarkets> {
        self.lookup(chain_id)
            .ok_or(NetworkError::UnsupportedChain(chain_id))?
            .markets()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.entries.values()
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContractRole;

    #[test]
    fn test_lookup_known_chain() {
        let config = lookup(chain::KOVAN).expect("kovan is registered");
        assert_eq!(config.name, "kovan");
        assert!(config.is_complete());
    }

    #[test]
    fn test_lookup_unknown_chain_has_no_fallback() {
        for chain_id in [0, 2, 56, 137, 31337, u64::MAX] {
            assert!(lookup(chain_id).is_none());
            assert_eq!(
                NetworkRegistry::builtin().resolve(chain_id),
                Err(NetworkError::UnsupportedChain(chain_id))
            );
        }
    }

    #[test]
    fn test_placeholder_chains_are_found_but_unusable() {
        let registry = NetworkRegistry::builtin();
        for chain_id in [chain::MAINNET, chain::ROPSTEN, chain::RINKEBY, chain::GOERLI] {
            let config = registry.lookup(chain_id).expect("placeholder is registered");
            assert!(!config.is_complete());
            assert!(matches!(
                registry.resolve(chain_id),
                Err(NetworkError::IncompleteConfig { .. })
            ));
        }
    }

    #[test]
    fn test_builtin_listing_is_ordered() {
        let ids: Vec<u64> = NetworkRegistry::builtin().chain_ids().collect();
        assert_eq!(ids, vec![1, 3, 4, 5, 42, 97]);
    }

    #[test]
    fn test_custom_registry_replaces_duplicates() {
        let first = NetworkConfig::placeholder(1337, "devnet");
        let second = NetworkConfig {
            controller: "0x0000000000000000000000000000000000000001",
            ..first
        };
        let registry = NetworkRegistry::new([first, second]);

        assert_eq!(registry.len(), 1);
        let entry = registry.lookup(1337).unwrap();
        assert_eq!(entry.missing_roles().first(), Some(&ContractRole::CollateralToken));
    }
}
