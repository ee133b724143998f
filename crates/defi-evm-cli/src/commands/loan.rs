//! Loan command
//!
//! Merges flags, environment and the configuration file into a
//! [`LoanRequest`] and runs the workflow over JSON-RPC.

use std::num::NonZeroU64;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use defi_evm_loan::{
    endpoint_label, execute_loan, BorrowPolicyConfig, FixedRatioPolicy, LoanOptions, LoanRequest,
    SigningKey,
};

use crate::config::{CliConfig, DEFAULT_CHAIN_ID};
use crate::error::CliReporter;

/// Borrow policy names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Borrow the full account liquidity
    AccountLiquidity,
    /// Borrow one unit per `--ratio` collateral units
    FixedRatio,
}

/// Deposit collateral and borrow against it
#[derive(Debug, Clone, Default, Args)]
pub struct LoanCommand {
    /// Hex private key of the borrowing account
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// JSON-RPC endpoint
    #[arg(long, env = "PROVIDER_URL")]
    pub rpc_url: Option<String>,

    /// Chain id of the lending deployment [default: 42]
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Collateral to deposit in whole tokens; the full balance when omitted
    #[arg(long, env = "DEPOSIT_AMOUNT")]
    pub amount: Option<String>,

    /// How the borrow amount is chosen
    #[arg(long, value_enum)]
    pub policy: Option<PolicyKind>,

    /// Collateral units per borrowed unit for the fixed-ratio policy
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub ratio: Option<u64>,

    /// Seconds to wait for each remote read or confirmation
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl LoanCommand {
    /// Combine this command with `config`; explicit values win.
    pub fn resolve(&self, config: &CliConfig) -> Result<(LoanRequest, LoanOptions)> {
        let private_key = self
            .private_key
            .clone()
            .ok_or_else(|| anyhow!("A private key is required (--private-key or PRIVATE_KEY)"))?;
        let rpc_url = self
            .rpc_url
            .clone()
            .or_else(|| config.rpc_url.clone())
            .ok_or_else(|| {
                anyhow!("An RPC endpoint is required (--rpc-url, PROVIDER_URL or rpc_url)")
            })?;
        let chain_id = self
            .chain_id
            .or(config.chain_id)
            .unwrap_or(DEFAULT_CHAIN_ID);

        let mut options = config.loan.clone();
        match self.timeout_secs {
            Some(0) => return Err(anyhow!("--timeout-secs must be at least 1")),
            Some(secs) => {
                options = options.with_confirmation_timeout(Duration::from_secs(secs));
            }
            None => {}
        }
        options.borrow_policy = self.borrow_policy(options.borrow_policy)?;

        let request = LoanRequest {
            signing_key: SigningKey::from(private_key),
            rpc_url,
            chain_id,
            deposit_amount: self.amount.clone(),
        };
        Ok((request, options))
    }

    fn borrow_policy(&self, configured: BorrowPolicyConfig) -> Result<BorrowPolicyConfig> {
        let ratio = self
            .ratio
            .map(|ratio| NonZeroU64::new(ratio).ok_or_else(|| anyhow!("--ratio must be positive")))
            .transpose()?;
        let configured_ratio = match configured {
            BorrowPolicyConfig::FixedRatio {
                collateral_per_unit,
            } => Some(collateral_per_unit),
            BorrowPolicyConfig::AccountLiquidity => None,
        };

        let policy = match (self.policy, ratio) {
            (Some(PolicyKind::AccountLiquidity), Some(_)) => {
                return Err(anyhow!("--ratio only applies to the fixed-ratio policy"))
            }
            (Some(PolicyKind::AccountLiquidity), None) => BorrowPolicyConfig::AccountLiquidity,
            (Some(PolicyKind::FixedRatio), _) | (None, Some(_)) => BorrowPolicyConfig::FixedRatio {
                collateral_per_unit: ratio
                    .or(configured_ratio)
                    .unwrap_or(FixedRatioPolicy::DEFAULT_RATIO),
            },
            (None, None) => configured,
        };
        Ok(policy)
    }

    /// Run the loan and return the process exit code.
    pub async fn execute(&self, config: &CliConfig, verbose: bool) -> Result<i32> {
        let (request, options) = self.resolve(config)?;
        info!(
            chain_id = request.chain_id,
            endpoint = %endpoint_label(&request.rpc_url),
            policy = ?options.borrow_policy,
            "Starting loan"
        );

        let result = execute_loan(request, &options).await;
        CliReporter::new(verbose, self.json).report_loan(&result)?;
        Ok(result.outcome.exit_code())
    }
}
