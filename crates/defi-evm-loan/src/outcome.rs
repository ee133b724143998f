//! Loan outcomes
//!
//! Every invocation of the workflow produces a [`LoanResult`]; failures are
//! returned as data, tagged with an [`OutcomeCode`] and the last step that
//! completed on chain.

use std::fmt;

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

//-----------------------------------------------------------------------------
// Outcome Codes
//-----------------------------------------------------------------------------

/// Result kind of a loan invocation. The numeric value doubles as the CLI
/// exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OutcomeCode {
    Success = 0,
    /// A submission, confirmation or remote read failed
    TransactionError = 1,
    /// A contract returned a non-zero logical error code
    ContractReturnError = 2,
    /// The chain id is not in the registry
    UnsupportedChain = 3,
    /// The requested deposit exceeds the collateral balance
    InsufficientBalance = 4,
    /// No borrowing capacity is available
    AccountLiquidity = 5,
    /// A confirmation was not observed within the configured bound
    Timeout = 6,
    /// Malformed signing key, endpoint or amount, or wrong endpoint chain
    InvalidInput = 7,
    /// The chain is registered but mandatory contracts are missing
    IncompleteConfiguration = 8,
}

impl OutcomeCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self == OutcomeCode::Success
    }

    /// Process exit code: zero only on success
    pub fn exit_code(self) -> i32 {
        i32::from(self.code())
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutcomeCode::Success => "NO_ERROR",
            OutcomeCode::TransactionError => "TRANSACTION_ERROR",
            OutcomeCode::ContractReturnError => "CONTRACT_RETURN_ERROR",
            OutcomeCode::UnsupportedChain => "UNSUPPORTED_CHAIN_ID",
            OutcomeCode::InsufficientBalance => "INSUFFICIENT_BALANCE",
            OutcomeCode::AccountLiquidity => "ACCOUNT_LIQUIDITY",
            OutcomeCode::Timeout => "TIMEOUT",
            OutcomeCode::InvalidInput => "INVALID_INPUT",
            OutcomeCode::IncompleteConfiguration => "INCOMPLETE_CONFIGURATION",
        };
        f.write_str(name)
    }
}

//-----------------------------------------------------------------------------
// Steps
//-----------------------------------------------------------------------------

/// Workflow steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStep {
    ResolveConfiguration,
    BindContext,
    DetermineDeposit,
    EnterMarkets,
    Approve,
    Mint,
    Borrow,
    Report,
}

impl LoanStep {
    /// Whether completing this step changed on-chain state
    pub fn mutates_chain(self) -> bool {
        matches!(
            self,
            LoanStep::EnterMarkets | LoanStep::Approve | LoanStep::Mint | LoanStep::Borrow
        )
    }
}

impl fmt::Display for LoanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoanStep::ResolveConfiguration => "resolve configuration",
            LoanStep::BindContext => "bind remote context",
            LoanStep::DetermineDeposit => "determine deposit",
            LoanStep::EnterMarkets => "enter markets",
            LoanStep::Approve => "approve",
            LoanStep::Mint => "mint",
            LoanStep::Borrow => "borrow",
            LoanStep::Report => "report",
        };
        f.write_str(name)
    }
}

//-----------------------------------------------------------------------------
// Results
//-----------------------------------------------------------------------------

/// Details of a completed loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanSummary {
    pub account: Address,
    /// Collateral deposited, in collateral smallest units
    pub deposited_units: U256,
    pub deposited: String,
    /// Amount borrowed, in borrow-token smallest units
    pub borrowed_units: U256,
    pub borrowed: String,
    /// Borrow-token balance after the borrow, in smallest units
    pub borrow_balance_units: U256,
    pub borrow_balance: String,
    /// Remaining account liquidity in USD, when the borrow policy reads it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_liquidity_usd: Option<String>,
    /// Block explorer link of the borrow transaction
    pub explorer_link: String,
}

/// Structured outcome of one loan invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanResult {
    pub outcome: OutcomeCode,
    pub message: String,
    /// Most recent confirmed transaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completed_step: Option<LoanStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<LoanSummary>,
}

impl LoanResult {
    pub fn success(message: impl Into<String>, tx_hash: TxHash, summary: LoanSummary) -> Self {
        Self {
            outcome: OutcomeCode::Success,
            message: message.into(),
            tx_hash: Some(tx_hash),
            last_completed_step: Some(LoanStep::Report),
            summary: Some(summary),
        }
    }

    pub fn failure(
        outcome: OutcomeCode,
        message: impl Into<String>,
        last_completed_step: Option<LoanStep>,
        tx_hash: Option<TxHash>,
    ) -> Self {
        Self {
            outcome,
            message: message.into(),
            tx_hash,
            last_completed_step,
            summary: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Whether a failure left on-chain state partially changed
    pub fn is_partial(&self) -> bool {
        !self.is_success()
            && self
                .last_completed_step
                .map(LoanStep::mutates_chain)
                .unwrap_or(false)
    }
}
