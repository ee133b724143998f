//! Command-line front end for the collateralised loan workflow.
//!
//! The binary is a thin layer over `defi-evm-loan`: it merges flags,
//! environment and an optional TOML file, installs the tracing subscriber,
//! runs one command and maps the loan outcome to the process exit code.

pub mod commands;
pub mod config;
pub mod error;
pub mod tracing;

pub use commands::*;
pub use config::{CliConfig, DEFAULT_CHAIN_ID};
pub use error::CliReporter;
