//! Contract address registry for Compound-fork lending deployments.
//!
//! Every supported chain id maps to a [`NetworkConfig`] compiled into the
//! binary. Lookups never fall back to another chain: an unknown id yields
//! `None`, and a known id whose mandatory addresses are not deployed yields a
//! config that fails [`NetworkConfig::markets`].
//!
//! ## Module Organization
//!
//! * **Configuration types**: `config` (raw entries, validated markets, roles)
//! * **Registry**: `registry` (built-in table, lookup)
//! * **Explorer helpers**: `explorer` (block explorer links, short addresses)
//! * **Errors**: `error`

pub mod config;
pub mod deployments;
pub mod error;
pub mod explorer;
pub mod registry;

pub use config::{ContractRole, LendingMarkets, NetworkConfig};
pub use error::{NetworkError, NetworkResult};
pub use explorer::{explorer_link, shorten, ExplorerKind};
pub use registry::{chain, lookup, NetworkRegistry};
