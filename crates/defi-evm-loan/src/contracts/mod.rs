//! Typed contract clients
//!
//! One trait per contract role the loan touches. Each trait exposes only the
//! calls the workflow needs, so the production JSON-RPC clients and the
//! in-memory test chain are interchangeable.
//!
//! * **Client Interfaces**: `TokenClient`, `MarketClient`, `ControllerClient`
//! * **Submissions**: `PendingTx` and `Confirmation`
//! * **Binding**: `ContractBinder` turns validated market addresses into a
//!   `LendingContracts` bundle
//! * **JSON-RPC implementation**: `rpc`

use std::fmt;
use std::future::Future;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;

use defi_evm_networks::LendingMarkets;

use crate::error::{BindError, ContractError, ContractResult};

pub mod rpc;

pub use rpc::{endpoint_label, RpcBinder, SigningKey};

//-----------------------------------------------------------------------------
// Submissions
//-----------------------------------------------------------------------------

/// A mined, successful transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// A submitted transaction whose confirmation can be awaited.
pub struct PendingTx {
    tx_hash: TxHash,
    confirmation: BoxFuture<'static, ContractResult<Confirmation>>,
}

impl PendingTx {
    pub fn new<F>(tx_hash: TxHash, confirmation: F) -> Self
    where
        F: Future<Output = ContractResult<Confirmation>> + Send + 'static,
    {
        Self {
            tx_hash,
            confirmation: confirmation.boxed(),
        }
    }

    /// Hash of the submitted transaction
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Wait until the transaction is mined.
    ///
    /// Resolves to an error if the transaction reverted or the receipt could
    /// not be obtained. The wait itself is unbounded.
    pub async fn confirmed(self) -> ContractResult<Confirmation> {
        self.confirmation.await
    }
}

impl fmt::Debug for PendingTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTx")
            .field("tx_hash", &self.tx_hash)
            .finish_non_exhaustive()
    }
}

//-----------------------------------------------------------------------------
// Client Interfaces
//-----------------------------------------------------------------------------

/// ERC-20 token (collateral and borrow assets)
#[async_trait]
pub trait TokenClient: Send + Sync {
    fn address(&self) -> Address;

    async fn balance_of(&self, owner: Address) -> ContractResult<U256>;

    /// Decimal precision declared by the token contract
    async fn decimals(&self) -> ContractResult<u8>;

    async fn approve(&self, spender: Address, amount: U256) -> ContractResult<PendingTx>;
}

/// Receipt token market (cToken)
#[async_trait]
pub trait MarketClient: Send + Sync {
    fn address(&self) -> Address;

    /// Supply `amount` of the underlying asset and mint receipt tokens
    async fn mint(&self, amount: U256) -> ContractResult<PendingTx>;

    /// Borrow `amount` of the underlying asset
    async fn borrow(&self, amount: U256) -> ContractResult<PendingTx>;
}

/// Liquidity tuple reported by the controller.
///
/// `liquidity` and `shortfall` are USD values with 18 decimals; at most one
/// of them is non-zero when `error_code` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AccountLiquidity {
    pub error_code: U256,
    pub liquidity: U256,
    pub shortfall: U256,
}

impl AccountLiquidity {
    /// Decimals of the USD values returned by the controller
    pub const USD_DECIMALS: u8 = 18;

    pub fn healthy(liquidity: U256) -> Self {
        Self {
            error_code: U256::ZERO,
            liquidity,
            shortfall: U256::ZERO,
        }
    }
}

/// Lending-pool controller (comptroller behind the unitroller)
#[async_trait]
pub trait ControllerClient: Send + Sync {
    fn address(&self) -> Address;

    async fn enter_markets(&self, markets: Vec<Address>) -> ContractResult<PendingTx>;

    async fn account_liquidity(&self, account: Address) -> ContractResult<AccountLiquidity>;
}

//-----------------------------------------------------------------------------
// Binding
//-----------------------------------------------------------------------------

/// Clients for every contract a loan touches, acting as `account`
pub struct LendingContracts {
    pub account: Address,
    pub controller: Box<dyn ControllerClient>,
    pub collateral_token: Box<dyn TokenClient>,
    pub collateral_market: Box<dyn MarketClient>,
    pub borrow_token: Box<dyn TokenClient>,
    pub borrow_market: Box<dyn MarketClient>,
}

impl fmt::Debug for LendingContracts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LendingContracts")
            .field("account", &self.account)
            .field("controller", &self.controller.address())
            .field("collateral_token", &self.collateral_token.address())
            .field("collateral_market", &self.collateral_market.address())
            .field("borrow_token", &self.borrow_token.address())
            .field("borrow_market", &self.borrow_market.address())
            .finish()
    }
}

/// Connects to a chain and binds clients for a set of market addresses
#[async_trait]
pub trait ContractBinder: Send + Sync {
    async fn bind(&self, markets: &LendingMarkets) -> Result<LendingContracts, BindError>;
}
