//! In-memory lending chain
//!
//! A deterministic stand-in for a Compound-fork deployment, used to exercise
//! the workflow without a node. Balances, decimals and liquidity are set up
//! front; every read and submission is recorded, and individual calls can be
//! made to fail, revert or never confirm.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use defi_evm_networks::LendingMarkets;

use crate::contracts::{
    AccountLiquidity, Confirmation, ContractBinder, ControllerClient, LendingContracts,
    MarketClient, PendingTx, TokenClient,
};
use crate::error::{BindError, ContractError, ContractResult};

//-----------------------------------------------------------------------------
// Recorded Calls
//-----------------------------------------------------------------------------

/// Kinds of contract calls the mock understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCallKind {
    BalanceOf,
    Decimals,
    Approve,
    EnterMarkets,
    Mint,
    Borrow,
    AccountLiquidity,
}

impl MockCallKind {
    pub fn is_submission(self) -> bool {
        matches!(
            self,
            MockCallKind::Approve
                | MockCallKind::EnterMarkets
                | MockCallKind::Mint
                | MockCallKind::Borrow
        )
    }
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub kind: MockCallKind,
    pub account: Address,
    /// Contract the call was made against
    pub contract: Address,
    pub amount: Option<U256>,
}

//-----------------------------------------------------------------------------
// Chain State
//-----------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MockState {
    /// (token, owner) -> balance
    balances: HashMap<(Address, Address), U256>,
    decimals: HashMap<Address, u8>,
    liquidity: HashMap<Address, AccountLiquidity>,
    entered: HashMap<Address, Vec<Address>>,
    calls: Vec<MockCall>,
    failing: HashSet<MockCallKind>,
    failing_contracts: HashSet<Address>,
    reverting: HashSet<MockCallKind>,
    stalled: HashSet<MockCallKind>,
    binds: usize,
    next_tx: u64,
}

impl MockState {
    fn balance(&self, token: Address, owner: Address) -> U256 {
        self.balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    fn next_tx_hash(&mut self) -> TxHash {
        self.next_tx += 1;
        TxHash::from(U256::from(self.next_tx).to_be_bytes::<32>())
    }
}

/// Shared in-memory chain for one lending deployment
#[derive(Debug, Clone)]
pub struct MockChain {
    markets: LendingMarkets,
    state: Arc<Mutex<MockState>>,
}

impl MockChain {
    /// Create a chain for `markets`. Every token starts with 18 decimals.
    pub fn new(markets: LendingMarkets) -> Self {
        let mut state = MockState::default();
        for token in [markets.collateral_token, markets.borrow_token] {
            state.decimals.insert(token, 18);
        }
        Self {
            markets,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn markets(&self) -> &LendingMarkets {
        &self.markets
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) -> &Self {
        self.state().balances.insert((token, owner), amount);
        self
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) -> &Self {
        self.state().decimals.insert(token, decimals);
        self
    }

    pub fn set_liquidity(&self, account: Address, liquidity: AccountLiquidity) -> &Self {
        self.state().liquidity.insert(account, liquidity);
        self
    }

    /// Make every call of `kind` fail before reaching the chain
    pub fn fail_on(&self, kind: MockCallKind) -> &Self {
        self.state().failing.insert(kind);
        self
    }

    /// Make every call against `contract` fail before reaching the chain
    pub fn fail_on_contract(&self, contract: Address) -> &Self {
        self.state().failing_contracts.insert(contract);
        self
    }

    /// Make every submission of `kind` be mined with a failed status
    pub fn revert_on(&self, kind: MockCallKind) -> &Self {
        self.state().reverting.insert(kind);
        self
    }

    /// Make every submission of `kind` never confirm
    pub fn stall_on(&self, kind: MockCallKind) -> &Self {
        self.state().stalled.insert(kind);
        self
    }

    pub fn balance(&self, token: Address, owner: Address) -> U256 {
        self.state().balance(token, owner)
    }

    pub fn entered_markets(&self, account: Address) -> Vec<Address> {
        self.state()
            .entered
            .get(&account)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    pub fn calls_for(&self, account: Address) -> Vec<MockCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.account == account)
            .cloned()
            .collect()
    }

    /// Submissions made by `account`, in order
    pub fn submissions_for(&self, account: Address) -> Vec<MockCallKind> {
        self.calls_for(account)
            .into_iter()
            .map(|call| call.kind)
            .filter(|kind| kind.is_submission())
            .collect()
    }

    /// Number of times a binder connected to this chain
    pub fn bind_count(&self) -> usize {
        self.state().binds
    }

    /// A binder acting as `account`
    pub fn binder(&self, account: Address) -> MockBinder {
        MockBinder {
            chain: self.clone(),
            account,
        }
    }

    fn record(
        &self,
        kind: MockCallKind,
        account: Address,
        contract: Address,
        amount: Option<U256>,
    ) -> ContractResult<()> {
        let mut state = self.state();
        state.calls.push(MockCall {
            kind,
            account,
            contract,
            amount,
        });
        if state.failing.contains(&kind) || state.failing_contracts.contains(&contract) {
            return Err(ContractError::rpc(call_name(kind), "mock failure"));
        }
        Ok(())
    }

    /// Record a submission, apply `effect` when it succeeds and return the
    /// pending transaction.
    fn submit(
        &self,
        kind: MockCallKind,
        account: Address,
        contract: Address,
        amount: Option<U256>,
        effect: impl FnOnce(&mut MockState) -> bool,
    ) -> ContractResult<PendingTx> {
        self.record(kind, account, contract, amount)?;

        let mut state = self.state();
        let tx_hash = state.next_tx_hash();
        let block_number = Some(state.next_tx);

        if state.stalled.contains(&kind) {
            return Ok(PendingTx::new(tx_hash, futures::future::pending()));
        }
        if state.reverting.contains(&kind) || !effect(&mut *state) {
            return Ok(PendingTx::new(tx_hash, async move {
                Err(ContractError::Reverted { tx_hash })
            }));
        }
        Ok(PendingTx::new(tx_hash, async move {
            Ok(Confirmation {
                tx_hash,
                block_number,
            })
        }))
    }
}

fn call_name(kind: MockCallKind) -> &'static str {
    match kind {
        MockCallKind::BalanceOf => "balanceOf",
        MockCallKind::Decimals => "decimals",
        MockCallKind::Approve => "approve",
        MockCallKind::EnterMarkets => "enterMarkets",
        MockCallKind::Mint => "mint",
        MockCallKind::Borrow => "borrow",
        MockCallKind::AccountLiquidity => "getAccountLiquidity",
    }
}

//-----------------------------------------------------------------------------
// Clients
//-----------------------------------------------------------------------------

/// Binds mock clients acting as one account
#[derive(Debug, Clone)]
pub struct MockBinder {
    chain: MockChain,
    account: Address,
}

#[async_trait]
impl ContractBinder for MockBinder {
    async fn bind(&self, markets: &LendingMarkets) -> Result<LendingContracts, BindError> {
        self.chain.state().binds += 1;
        if markets.chain_id != self.chain.markets.chain_id {
            return Err(BindError::ChainMismatch {
                expected: markets.chain_id,
                actual: self.chain.markets.chain_id,
            });
        }

        let client = |address| MockClient {
            chain: self.chain.clone(),
            account: self.account,
            address,
        };
        Ok(LendingContracts {
            account: self.account,
            controller: Box::new(client(markets.controller)),
            collateral_token: Box::new(client(markets.collateral_token)),
            collateral_market: Box::new(client(markets.collateral_receipt_token)),
            borrow_token: Box::new(client(markets.borrow_token)),
            borrow_market: Box::new(client(markets.borrow_receipt_token)),
        })
    }
}

/// One contract seen from one account
#[derive(Debug, Clone)]
struct MockClient {
    chain: MockChain,
    account: Address,
    address: Address,
}

#[async_trait]
impl TokenClient for MockClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn balance_of(&self, owner: Address) -> ContractResult<U256> {
        self.chain
            .record(MockCallKind::BalanceOf, self.account, self.address, None)?;
        Ok(self.chain.balance(self.address, owner))
    }

    async fn decimals(&self) -> ContractResult<u8> {
        self.chain
            .record(MockCallKind::Decimals, self.account, self.address, None)?;
        Ok(self
            .chain
            .state()
            .decimals
            .get(&self.address)
            .copied()
            .unwrap_or(18))
    }

    async fn approve(&self, _spender: Address, amount: U256) -> ContractResult<PendingTx> {
        self.chain.submit(
            MockCallKind::Approve,
            self.account,
            self.address,
            Some(amount),
            |_| true,
        )
    }
}

#[async_trait]
impl MarketClient for MockClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn mint(&self, amount: U256) -> ContractResult<PendingTx> {
        let account = self.account;
        let market = self.address;
        let underlying = self.chain.markets.collateral_token;
        self.chain
            .submit(MockCallKind::Mint, account, market, Some(amount), |state| {
                let held = state.balance(underlying, account);
                if held < amount {
                    return false;
                }
                state.balances.insert((underlying, account), held - amount);
                let minted = state.balance(market, account) + amount;
                state.balances.insert((market, account), minted);
                true
            })
    }

    async fn borrow(&self, amount: U256) -> ContractResult<PendingTx> {
        let account = self.account;
        let underlying = self.chain.markets.borrow_token;
        self.chain.submit(
            MockCallKind::Borrow,
            account,
            self.address,
            Some(amount),
            |state| {
                let held = state.balance(underlying, account);
                state.balances.insert((underlying, account), held + amount);
                if let Some(reading) = state.liquidity.get_mut(&account) {
                    reading.liquidity = reading.liquidity.saturating_sub(amount);
                }
                true
            },
        )
    }
}

#[async_trait]
impl ControllerClient for MockClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn enter_markets(&self, markets: Vec<Address>) -> ContractResult<PendingTx> {
        let account = self.account;
        self.chain.submit(
            MockCallKind::EnterMarkets,
            account,
            self.address,
            None,
            move |state| {
                let entered = state.entered.entry(account).or_default();
                for market in markets {
                    if !entered.contains(&market) {
                        entered.push(market);
                    }
                }
                true
            },
        )
    }

    async fn account_liquidity(&self, account: Address) -> ContractResult<AccountLiquidity> {
        self.chain
            .record(MockCallKind::AccountLiquidity, self.account, self.address, None)?;
        Ok(self
            .chain
            .state()
            .liquidity
            .get(&account)
            .copied()
            .unwrap_or_default())
    }
}
