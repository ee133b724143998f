//! JSON-RPC contract clients
//!
//! Bindings are generated with `alloy::sol!` from the handful of functions
//! the workflow calls, and every client shares one type-erased provider that
//! signs with the caller's key.

use std::fmt;
use std::str::FromStr;

use alloy::network::{Ethereum, EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use defi_evm_networks::LendingMarkets;

use super::{
    AccountLiquidity, Confirmation, ContractBinder, ControllerClient, LendingContracts,
    MarketClient, PendingTx, TokenClient,
};
use crate::error::{BindError, ContractError, ContractResult};

sol! {
    #[sol(rpc)]
    interface IErc20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface ICErc20 {
        function mint(uint256 mintAmount) external returns (uint256);
        function borrow(uint256 borrowAmount) external returns (uint256);
    }

    #[sol(rpc)]
    interface IComptroller {
        function enterMarkets(address[] calldata cTokens) external returns (uint256[] memory);
        function getAccountLiquidity(address account)
            external
            view
            returns (uint256 errorCode, uint256 liquidity, uint256 shortfall);
    }
}

//-----------------------------------------------------------------------------
// Signing Key
//-----------------------------------------------------------------------------

/// Hex-encoded private key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    fn signer(&self) -> Result<PrivateKeySigner, BindError> {
        PrivateKeySigner::from_str(self.0.trim())
            .map_err(|err| BindError::InvalidKey(err.to_string()))
    }

    /// Address controlled by this key
    pub fn address(&self) -> Result<Address, BindError> {
        self.signer().map(|signer| signer.address())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

impl From<&str> for SigningKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SigningKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

//-----------------------------------------------------------------------------
// Endpoint Display
//-----------------------------------------------------------------------------

/// Printable form of an RPC endpoint: scheme, host and port only.
///
/// Hosted providers carry API keys in the path, query or userinfo, so the
/// full URL never reaches logs or error messages.
pub fn endpoint_label(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}://{host}:{port}", url.scheme()),
            (Some(host), None) => format!("{}://{host}", url.scheme()),
            (None, _) => format!("{}:<redacted>", url.scheme()),
        },
        Err(_) => "<unparseable endpoint>".to_string(),
    }
}

//-----------------------------------------------------------------------------
// Submission Helpers
//-----------------------------------------------------------------------------

fn rpc_error(call: &'static str) -> impl FnOnce(alloy::contract::Error) -> ContractError {
    move |err| ContractError::rpc(call, err.to_string())
}

/// Wrap an alloy pending transaction so the workflow can await its receipt.
fn pending(builder: PendingTransactionBuilder<Ethereum>) -> PendingTx {
    let tx_hash = *builder.tx_hash();
    PendingTx::new(tx_hash, async move {
        let receipt = builder
            .get_receipt()
            .await
            .map_err(|err| ContractError::Confirmation {
                tx_hash,
                message: err.to_string(),
            })?;
        if !ReceiptResponse::status(&receipt) {
            return Err(ContractError::Reverted { tx_hash });
        }
        Ok(Confirmation {
            tx_hash,
            block_number: ReceiptResponse::block_number(&receipt),
        })
    })
}

//-----------------------------------------------------------------------------
// Clients
//-----------------------------------------------------------------------------

struct RpcToken {
    contract: IErc20::IErc20Instance<DynProvider>,
}

#[async_trait]
impl TokenClient for RpcToken {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn balance_of(&self, owner: Address) -> ContractResult<U256> {
        self.contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(rpc_error("balanceOf"))
    }

    async fn decimals(&self) -> ContractResult<u8> {
        self.contract
            .decimals()
            .call()
            .await
            .map_err(rpc_error("decimals"))
    }

    async fn approve(&self, spender: Address, amount: U256) -> ContractResult<PendingTx> {
        let builder = self
            .contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(rpc_error("approve"))?;
        debug!(tx_hash = %builder.tx_hash(), "approve submitted");
        Ok(pending(builder))
    }
}

struct RpcMarket {
    contract: ICErc20::ICErc20Instance<DynProvider>,
}

#[async_trait]
impl MarketClient for RpcMarket {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn mint(&self, amount: U256) -> ContractResult<PendingTx> {
        let builder = self
            .contract
            .mint(amount)
            .send()
            .await
            .map_err(rpc_error("mint"))?;
        debug!(tx_hash = %builder.tx_hash(), "mint submitted");
        Ok(pending(builder))
    }

    async fn borrow(&self, amount: U256) -> ContractResult<PendingTx> {
        let builder = self
            .contract
            .borrow(amount)
            .send()
            .await
            .map_err(rpc_error("borrow"))?;
        debug!(tx_hash = %builder.tx_hash(), "borrow submitted");
        Ok(pending(builder))
    }
}

struct RpcController {
    contract: IComptroller::IComptrollerInstance<DynProvider>,
}

#[async_trait]
impl ControllerClient for RpcController {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn enter_markets(&self, markets: Vec<Address>) -> ContractResult<PendingTx> {
        let builder = self
            .contract
            .enterMarkets(markets)
            .send()
            .await
            .map_err(rpc_error("enterMarkets"))?;
        debug!(tx_hash = %builder.tx_hash(), "enterMarkets submitted");
        Ok(pending(builder))
    }

    async fn account_liquidity(&self, account: Address) -> ContractResult<AccountLiquidity> {
        let result = self
            .contract
            .getAccountLiquidity(account)
            .call()
            .await
            .map_err(rpc_error("getAccountLiquidity"))?;
        Ok(AccountLiquidity {
            error_code: result.errorCode,
            liquidity: result.liquidity,
            shortfall: result.shortfall,
        })
    }
}

//-----------------------------------------------------------------------------
// Binder
//-----------------------------------------------------------------------------

/// Binds JSON-RPC clients signing with `signing_key` against `rpc_url`.
///
/// Nothing is parsed or contacted until [`ContractBinder::bind`] runs.
#[derive(Debug, Clone)]
pub struct RpcBinder {
    signing_key: SigningKey,
    rpc_url: String,
}

impl RpcBinder {
    pub fn new(signing_key: SigningKey, rpc_url: impl Into<String>) -> Self {
        Self {
            signing_key,
            rpc_url: rpc_url.into(),
        }
    }

    fn endpoint(&self) -> Result<Url, BindError> {
        Url::parse(self.rpc_url.trim()).map_err(|err| BindError::InvalidEndpoint {
            url: endpoint_label(&self.rpc_url),
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl ContractBinder for RpcBinder {
    async fn bind(&self, markets: &LendingMarkets) -> Result<LendingContracts, BindError> {
        let signer = self.signing_key.signer()?;
        let account = signer.address();
        let url = self.endpoint()?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        let actual = provider
            .get_chain_id()
            .await
            .map_err(|err| BindError::Rpc(err.to_string()))?;
        if actual != markets.chain_id {
            return Err(BindError::ChainMismatch {
                expected: markets.chain_id,
                actual,
            });
        }
        debug!(
            %account,
            chain_id = actual,
            endpoint = %endpoint_label(&self.rpc_url),
            "connected to RPC endpoint"
        );

        Ok(LendingContracts {
            account,
            controller: Box::new(RpcController {
                contract: IComptroller::new(markets.controller, provider.clone()),
            }),
            collateral_token: Box::new(RpcToken {
                contract: IErc20::new(markets.collateral_token, provider.clone()),
            }),
            collateral_market: Box::new(RpcMarket {
                contract: ICErc20::new(markets.collateral_receipt_token, provider.clone()),
            }),
            borrow_token: Box::new(RpcToken {
                contract: IErc20::new(markets.borrow_token, provider.clone()),
            }),
            borrow_market: Box::new(RpcMarket {
                contract: ICErc20::new(markets.borrow_receipt_token, provider),
            }),
        })
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------
