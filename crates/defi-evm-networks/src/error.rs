//! Registry error types

use thiserror::Error;

use crate::config::ContractRole;

/// Errors raised while resolving a chain id into usable contract addresses.
///
/// These are configuration errors: they can be detected before any remote
/// call is made and are never the result of network conditions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The chain id has no entry in the registry
    #[error("Chain id {0} is not currently supported")]
    UnsupportedChain(u64),

    /// The chain id is registered but mandatory contracts are not deployed
    #[error("Chain id {chain_id} is missing mandatory addresses: {}", join_roles(.missing))]
    IncompleteConfig {
        chain_id: u64,
        missing: Vec<ContractRole>,
    },

    /// A configured address is not a 20-byte hex address
    #[error("Invalid {role} address `{value}` for chain id {chain_id}")]
    InvalidAddress {
        chain_id: u64,
        role: ContractRole,
        value: String,
    },
}

fn join_roles(roles: &[ContractRole]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenient Result type for registry operations
pub type NetworkResult<T> = Result<T, NetworkError>;
