//! Loan workflow
//!
//! Runs the fixed step sequence against one lending deployment:
//!
//! 1. resolve the chain id in the registry
//! 2. bind contract clients and derive the caller address
//! 3. determine the deposit from the collateral balance
//! 4. enter the collateral and borrow markets
//! 5. approve the collateral market and mint receipt tokens
//! 6. borrow the amount chosen by the borrow policy
//! 7. report the resulting borrow-token balance
//!
//! Each step waits for the previous one to be confirmed on chain. The first
//! failure ends the run; nothing is retried or rolled back.

use std::future::Future;
use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use defi_evm_networks::{explorer_link, ExplorerKind, NetworkError, NetworkRegistry};

use crate::contracts::{
    AccountLiquidity, Confirmation, ContractBinder, LendingContracts, PendingTx, RpcBinder,
    SigningKey,
};
use crate::error::ContractResult;
use crate::options::LoanOptions;
use crate::outcome::{LoanResult, LoanStep, LoanSummary, OutcomeCode};
use crate::policy::{BorrowContext, BorrowPolicy};
use crate::units::{format_units, fraction_digits, parse_units};

//-----------------------------------------------------------------------------
// Entry Point
//-----------------------------------------------------------------------------

/// Inputs of one loan invocation
#[derive(Debug, Clone)]
pub struct LoanRequest {
    pub signing_key: SigningKey,
    pub rpc_url: String,
    pub chain_id: u64,
    /// Human readable collateral amount; the full balance when `None`
    pub deposit_amount: Option<String>,
}

/// Run a loan over JSON-RPC against the built-in network registry.
pub async fn execute_loan(request: LoanRequest, options: &LoanOptions) -> LoanResult {
    let registry = NetworkRegistry::builtin();
    let binder = RpcBinder::new(request.signing_key, request.rpc_url);
    LoanWorkflow::new(&registry, options.clone())
        .execute(&binder, request.chain_id, request.deposit_amount.as_deref())
        .await
}

//-----------------------------------------------------------------------------
// Step Bookkeeping
//-----------------------------------------------------------------------------

struct Failure {
    outcome: OutcomeCode,
    message: String,
}

impl Failure {
    fn new(outcome: OutcomeCode, message: impl Into<String>) -> Self {
        Self {
            outcome,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    last_step: Option<LoanStep>,
    last_tx: Option<TxHash>,
}

impl Progress {
    fn complete(&mut self, step: LoanStep) {
        debug!(%step, "step completed");
        self.last_step = Some(step);
    }

    fn confirmed(&mut self, step: LoanStep, confirmation: &Confirmation) {
        self.last_tx = Some(confirmation.tx_hash);
        self.complete(step);
    }
}

//-----------------------------------------------------------------------------
// Workflow
//-----------------------------------------------------------------------------

/// Sequential loan workflow bound to a registry and a borrow policy.
///
/// The workflow holds no per-invocation state, so one instance can serve
/// concurrent invocations for different accounts.
pub struct LoanWorkflow<'r> {
    registry: &'r NetworkRegistry,
    timeout: Duration,
    policy: Box<dyn BorrowPolicy>,
}

impl<'r> LoanWorkflow<'r> {
    pub fn new(registry: &'r NetworkRegistry, options: LoanOptions) -> Self {
        Self {
            registry,
            timeout: options.confirmation_timeout(),
            policy: options.borrow_policy.build(),
        }
    }

    /// Replace the policy selected by the options
    pub fn with_policy(mut self, policy: Box<dyn BorrowPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &dyn BorrowPolicy {
        self.policy.as_ref()
    }

    /// Execute the loan for the account controlled by `binder`.
    #[instrument(skip(self, binder, deposit_amount), fields(policy = self.policy.name()))]
    pub async fn execute<B>(
        &self,
        binder: &B,
        chain_id: u64,
        deposit_amount: Option<&str>,
    ) -> LoanResult
    where
        B: ContractBinder + ?Sized,
    {
        let mut progress = Progress::default();
        match self.run(binder, chain_id, deposit_amount, &mut progress).await {
            Ok((tx_hash, summary)) => {
                let message = format!(
                    "Successfully borrowed {}. Your current borrow token balance is: {}",
                    summary.borrowed, summary.borrow_balance
                );
                info!(%tx_hash, "{message}");
                LoanResult::success(message, tx_hash, summary)
            }
            Err(failure) => {
                let message = match progress.last_step {
                    Some(step) if step.mutates_chain() => {
                        format!("{} (last completed step: {step})", failure.message)
                    }
                    _ => failure.message,
                };
                error!(
                    code = %failure.outcome,
                    last_completed_step = ?progress.last_step,
                    "{message}"
                );
                LoanResult::failure(failure.outcome, message, progress.last_step, progress.last_tx)
            }
        }
    }

    async fn run<B>(
        &self,
        binder: &B,
        chain_id: u64,
        deposit_amount: Option<&str>,
        progress: &mut Progress,
    ) -> Result<(TxHash, LoanSummary), Failure>
    where
        B: ContractBinder + ?Sized,
    {
        let markets = self.registry.resolve(chain_id).map_err(|err| {
            let outcome = match err {
                NetworkError::UnsupportedChain(_) => OutcomeCode::UnsupportedChain,
                _ => OutcomeCode::IncompleteConfiguration,
            };
            Failure::new(outcome, err.to_string())
        })?;
        progress.complete(LoanStep::ResolveConfiguration);

        let contracts = match timeout(self.timeout, binder.bind(&markets)).await {
            Ok(Ok(contracts)) => contracts,
            Ok(Err(err)) => {
                let outcome = if err.is_input_error() {
                    OutcomeCode::InvalidInput
                } else {
                    OutcomeCode::TransactionError
                };
                return Err(Failure::new(
                    outcome,
                    format!("Error binding contracts for chain id {chain_id}: {err}"),
                ));
            }
            Err(_) => {
                return Err(self.timed_out("Error connecting to the RPC endpoint"));
            }
        };
        let account = contracts.account;
        progress.complete(LoanStep::BindContext);

        // Deposit amount
        info!(%account, "Obtaining collateral balance");
        let context = format!(
            "Error obtaining collateral token {} balance for account {account}",
            markets.collateral_token
        );
        let balance = self
            .bounded(contracts.collateral_token.balance_of(account), &context)
            .await?;
        let collateral_decimals = self
            .bounded(contracts.collateral_token.decimals(), &context)
            .await?;
        let deposit = determine_deposit(balance, collateral_decimals, deposit_amount)?;
        debug!(%balance, %deposit, collateral_decimals, "deposit determined");
        progress.complete(LoanStep::DetermineDeposit);

        // Markets
        info!(
            collateral_market = %markets.collateral_receipt_token,
            borrow_market = %markets.borrow_receipt_token,
            "Entering markets"
        );
        let confirmation = self
            .transact(
                contracts.controller.enter_markets(vec![
                    markets.collateral_receipt_token,
                    markets.borrow_receipt_token,
                ]),
                &format!(
                    "Error entering markets {} and {} for account {account}",
                    markets.collateral_receipt_token, markets.borrow_receipt_token
                ),
            )
            .await?;
        progress.confirmed(LoanStep::EnterMarkets, &confirmation);

        // Collateral
        info!(spender = %markets.collateral_receipt_token, %deposit, "Approving collateral market");
        let confirmation = self
            .transact(
                contracts
                    .collateral_token
                    .approve(markets.collateral_receipt_token, deposit),
                &format!(
                    "Error approving collateral market {} to transfer {deposit} units for account {account}",
                    markets.collateral_receipt_token
                ),
            )
            .await?;
        progress.confirmed(LoanStep::Approve, &confirmation);

        info!(market = %markets.collateral_receipt_token, %deposit, "Minting receipt tokens");
        let confirmation = self
            .transact(
                contracts.collateral_market.mint(deposit),
                &format!("Error minting receipt tokens for account {account} with deposit of {deposit} units"),
            )
            .await?;
        progress.confirmed(LoanStep::Mint, &confirmation);

        // Borrow
        let decision = match timeout(
            self.timeout,
            self.policy.borrow_amount(BorrowContext {
                contracts: &contracts,
                deposit,
                collateral_decimals,
            }),
        )
        .await
        {
            Ok(Ok(decision)) => decision,
            Ok(Err(err)) => {
                return Err(Failure::new(
                    err.outcome(),
                    format!("Error determining borrow amount for account {account}: {err}"),
                ));
            }
            Err(_) => return Err(self.timed_out("Error determining borrow amount")),
        };

        info!(amount = %decision.amount, policy = self.policy.name(), "Borrowing");
        let confirmation = self
            .transact(
                contracts.borrow_market.borrow(decision.amount),
                &format!(
                    "Error borrowing {} units for account {account} with deposit of {deposit} units",
                    decision.amount
                ),
            )
            .await?;
        progress.confirmed(LoanStep::Borrow, &confirmation);
        let borrow_tx = confirmation.tx_hash;

        // Report
        let context = format!(
            "Error obtaining borrow token {} balance for account {account}",
            markets.borrow_token
        );
        let borrow_balance = self
            .bounded(contracts.borrow_token.balance_of(account), &context)
            .await?;
        let borrow_decimals = self
            .bounded(contracts.borrow_token.decimals(), &context)
            .await?;
        let remaining_liquidity_usd = if self.policy.reads_liquidity() {
            self.remaining_liquidity(&contracts).await
        } else {
            None
        };
        progress.complete(LoanStep::Report);

        let summary = LoanSummary {
            account,
            deposited_units: deposit,
            deposited: format_units(deposit, collateral_decimals),
            borrowed_units: decision.amount,
            borrowed: format_units(decision.amount, borrow_decimals),
            borrow_balance_units: borrow_balance,
            borrow_balance: format_units(borrow_balance, borrow_decimals),
            remaining_liquidity_usd,
            explorer_link: explorer_link(
                chain_id,
                &borrow_tx.to_string(),
                ExplorerKind::Transaction,
            ),
        };
        Ok((borrow_tx, summary))
    }

    /// Await a remote call, bounded by the configured timeout.
    async fn bounded<T, F>(&self, call: F, context: &str) -> Result<T, Failure>
    where
        F: Future<Output = ContractResult<T>>,
    {
        match timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(Failure::new(
                OutcomeCode::TransactionError,
                format!("{context}: {err}"),
            )),
            Err(_) => Err(self.timed_out(context)),
        }
    }

    /// Submit a transaction and wait for its confirmation within one bound.
    async fn transact<F>(&self, submission: F, context: &str) -> Result<Confirmation, Failure>
    where
        F: Future<Output = ContractResult<PendingTx>>,
    {
        let confirmed = async move {
            let pending = submission.await?;
            debug!(tx_hash = %pending.tx_hash(), "waiting for confirmation");
            pending.confirmed().await
        };
        let confirmation = self.bounded(confirmed, context).await?;
        debug!(
            tx_hash = %confirmation.tx_hash,
            block_number = ?confirmation.block_number,
            "transaction confirmed"
        );
        Ok(confirmation)
    }

    fn timed_out(&self, context: &str) -> Failure {
        Failure::new(
            OutcomeCode::Timeout,
            format!("{context}: no response within {}s", self.timeout.as_secs()),
        )
    }

    /// Best-effort read of the liquidity left after borrowing
    async fn remaining_liquidity(&self, contracts: &LendingContracts) -> Option<String> {
        let reading = timeout(
            self.timeout,
            contracts.controller.account_liquidity(contracts.account),
        )
        .await;
        match reading {
            Ok(Ok(reading)) if reading.error_code.is_zero() => Some(format_units(
                reading.liquidity,
                AccountLiquidity::USD_DECIMALS,
            )),
            Ok(Ok(reading)) => {
                warn!(error_code = %reading.error_code, "remaining liquidity unavailable");
                None
            }
            Ok(Err(err)) => {
                warn!(%err, "remaining liquidity unavailable");
                None
            }
            Err(_) => {
                warn!("remaining liquidity read timed out");
                None
            }
        }
    }
}

/// Pick the deposit: the requested amount if it is covered by `balance`,
/// otherwise the full balance.
fn determine_deposit(
    balance: U256,
    decimals: u8,
    requested: Option<&str>,
) -> Result<U256, Failure> {
    let deposit = match requested {
        None => balance,
        Some(raw) => {
            let amount = parse_units(raw, decimals).map_err(|err| {
                Failure::new(
                    OutcomeCode::InvalidInput,
                    format!("Invalid deposit amount: {err}"),
                )
            })?;
            if fraction_digits(raw) > usize::from(decimals) {
                warn!(requested = raw, decimals, "deposit amount truncated to token precision");
            }
            if amount > balance {
                return Err(Failure::new(
                    OutcomeCode::InsufficientBalance,
                    format!(
                        "Collateral balance of: {} is less than desired deposit of: {}",
                        format_units(balance, decimals),
                        format_units(amount, decimals)
                    ),
                ));
            }
            amount
        }
    };

    if deposit.is_zero() {
        return Err(Failure::new(
            OutcomeCode::InsufficientBalance,
            "Nothing to deposit: the collateral amount is zero",
        ));
    }
    Ok(deposit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_balance_when_no_amount_requested() {
        let deposit = determine_deposit(U256::from(1000), 0, None).ok();
        assert_eq!(deposit, Some(U256::from(1000)));
    }

    #[test]
    fn test_requested_amount_within_balance() {
        let deposit = determine_deposit(U256::from(20_000), 2, Some("100.5")).ok();
        assert_eq!(deposit, Some(U256::from(10_050)));
    }

    #[test]
    fn test_requested_amount_above_balance() {
        let failure = determine_deposit(U256::from(10_000), 2, Some("100.5"))
            .err()
            .unwrap();
        assert_eq!(failure.outcome, OutcomeCode::InsufficientBalance);
        assert_eq!(
            failure.message,
            "Collateral balance of: 100.0 is less than desired deposit of: 100.5"
        );
    }

    #[test]
    fn test_malformed_amount() {
        let failure = determine_deposit(U256::from(10), 0, Some("ten")).err().unwrap();
        assert_eq!(failure.outcome, OutcomeCode::InvalidInput);
    }

    #[test]
    fn test_zero_deposit_is_rejected() {
        let failure = determine_deposit(U256::ZERO, 18, None).err().unwrap();
        assert_eq!(failure.outcome, OutcomeCode::InsufficientBalance);
    }
}
