//! Subcommands of the `defi-evm` binary

pub mod loan;
pub mod networks;

pub use loan::{LoanCommand, PolicyKind};
pub use networks::NetworksCommand;
