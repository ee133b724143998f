//! Error types for amount parsing and contract interaction

use alloy::primitives::TxHash;
use thiserror::Error;

/// Errors converting a human readable amount into smallest units
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Amount `{0}` is not a non-negative decimal number")]
    Malformed(String),

    #[error("Amount `{0}` does not fit in 256 bits")]
    Overflow(String),

    #[error("Decimal precision {0} is out of range")]
    Precision(u8),
}

/// Errors raised by a contract client call or submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The call or submission never reached the chain
    #[error("RPC call `{call}` failed: {message}")]
    Rpc {
        call: &'static str,
        message: String,
    },

    /// The transaction was mined with a failed status
    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },

    /// Waiting for the receipt failed
    #[error("Confirmation of transaction {tx_hash} failed: {message}")]
    Confirmation { tx_hash: TxHash, message: String },
}

impl ContractError {
    pub fn rpc(call: &'static str, message: impl Into<String>) -> Self {
        ContractError::Rpc {
            call,
            message: message.into(),
        }
    }
}

/// Convenient Result type for contract calls
pub type ContractResult<T> = Result<T, ContractError>;

/// Errors establishing the remote context for a loan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Invalid RPC endpoint `{url}`: {message}")]
    InvalidEndpoint { url: String, message: String },

    #[error("RPC endpoint reports chain id {actual}, expected {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("RPC connection failed: {0}")]
    Rpc(String),
}

impl BindError {
    /// Whether the error comes from caller input rather than the network
    pub fn is_input_error(&self) -> bool {
        !matches!(self, BindError::Rpc(_))
    }
}
