//! Collateralised loan workflow for Compound-fork lending deployments.
//!
//! The workflow deposits a collateral token, mints its receipt token, enters
//! the collateral and borrow markets and borrows against the resulting
//! liquidity. Contract logic stays on chain; this crate only sequences the
//! calls and reports what happened.
//!
//! ## Module Organization
//!
//! * **Workflow**: `workflow` (the step sequence, `execute_loan`)
//! * **Outcomes**: `outcome` (`LoanResult`, `OutcomeCode`, `LoanStep`)
//! * **Borrow policies**: `policy` (how much to borrow)
//! * **Contract clients**: `contracts` (typed per-role client traits and the
//!   alloy JSON-RPC implementation)
//! * **Amounts**: `units` (decimal string / smallest unit conversion)
//! * **Configuration**: `options`
//! * **Testing utilities**: `mock` (in-memory chain double)

pub mod contracts;
pub mod error;
pub mod mock;
pub mod options;
pub mod outcome;
pub mod policy;
pub mod units;
pub mod workflow;

pub use contracts::{
    endpoint_label, AccountLiquidity, Confirmation, ContractBinder, ControllerClient,
    LendingContracts, MarketClient, PendingTx, RpcBinder, SigningKey, TokenClient,
};
pub use error::{AmountError, BindError, ContractError, ContractResult};
pub use options::LoanOptions;
pub use outcome::{LoanResult, LoanStep, LoanSummary, OutcomeCode};
pub use policy::{
    AccountLiquidityPolicy, BorrowContext, BorrowDecision, BorrowPolicy, BorrowPolicyConfig,
    FixedRatioPolicy, PolicyError,
};
pub use workflow::{execute_loan, LoanRequest, LoanWorkflow};

// Re-export the registry so callers need a single dependency
pub use defi_evm_networks as networks;
