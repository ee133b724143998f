//! Borrow amount policies
//!
//! The workflow asks a [`BorrowPolicy`] how much to borrow once the
//! collateral has been minted. Two policies exist:
//!
//! * [`AccountLiquidityPolicy`] (default) borrows the full account liquidity
//!   reported by the controller.
//! * [`FixedRatioPolicy`] borrows one borrow-token unit per N collateral
//!   units deposited, without asking the controller.

use std::fmt;
use std::num::NonZeroU64;

use alloy::primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::contracts::{AccountLiquidity, LendingContracts};
use crate::error::ContractError;
use crate::outcome::OutcomeCode;
use crate::units::pow10;

//-----------------------------------------------------------------------------
// Policy Interface
//-----------------------------------------------------------------------------

/// State available to a policy when the borrow step starts
pub struct BorrowContext<'a> {
    pub contracts: &'a LendingContracts,
    /// Collateral deposited, in smallest units
    pub deposit: U256,
    /// Decimals reported by the collateral token
    pub collateral_decimals: u8,
}

/// How much to borrow, plus the liquidity reading it was based on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowDecision {
    pub amount: U256,
    pub liquidity: Option<AccountLiquidity>,
}

/// Reasons a policy refuses to produce a borrow amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("Returned a non-zero error value when obtaining account liquidity: {0}")]
    ErrorCode(U256),

    #[error("Cannot borrow funds as returned account liquidity is zero. Current shortfall is: {shortfall}")]
    NoLiquidity { shortfall: U256 },

    #[error("Deposit of {deposit} collateral units is too small to borrow at {ratio} units per borrow unit")]
    DepositTooSmall { deposit: U256, ratio: u64 },

    #[error("Borrow amount overflowed")]
    Overflow,
}

impl PolicyError {
    pub fn outcome(&self) -> OutcomeCode {
        match self {
            PolicyError::Contract(_) => OutcomeCode::TransactionError,
            PolicyError::ErrorCode(_) => OutcomeCode::ContractReturnError,
            PolicyError::NoLiquidity { .. } | PolicyError::DepositTooSmall { .. } => {
                OutcomeCode::AccountLiquidity
            }
            PolicyError::Overflow => OutcomeCode::InvalidInput,
        }
    }
}

/// Decides the borrow amount for a loan
#[async_trait]
pub trait BorrowPolicy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Whether the policy reads account liquidity, in which case the
    /// remaining liquidity is reported after the borrow.
    fn reads_liquidity(&self) -> bool;

    async fn borrow_amount(&self, ctx: BorrowContext<'_>) -> Result<BorrowDecision, PolicyError>;
}

//-----------------------------------------------------------------------------
// Account Liquidity Policy
//-----------------------------------------------------------------------------

/// Borrow the full liquidity the controller reports for the account.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountLiquidityPolicy;

#[async_trait]
impl BorrowPolicy for AccountLiquidityPolicy {
    fn name(&self) -> &'static str {
        "account-liquidity"
    }

    fn reads_liquidity(&self) -> bool {
        true
    }

    async fn borrow_amount(&self, ctx: BorrowContext<'_>) -> Result<BorrowDecision, PolicyError> {
        let account = ctx.contracts.account;
        let reading = ctx.contracts.controller.account_liquidity(account).await?;
        debug!(
            %account,
            error_code = %reading.error_code,
            liquidity = %reading.liquidity,
            shortfall = %reading.shortfall,
            "account liquidity"
        );

        if !reading.error_code.is_zero() {
            return Err(PolicyError::ErrorCode(reading.error_code));
        }
        if reading.liquidity.is_zero() {
            return Err(PolicyError::NoLiquidity {
                shortfall: reading.shortfall,
            });
        }

        Ok(BorrowDecision {
            amount: reading.liquidity,
            liquidity: Some(reading),
        })
    }
}

//-----------------------------------------------------------------------------
// Fixed Ratio Policy
//-----------------------------------------------------------------------------

/// Borrow one borrow-token unit per `collateral_per_unit` collateral units.
///
/// Whole units are scaled by each token's own decimals, so a deposit of
/// `1000.0` collateral at ratio 5 borrows `200.0` regardless of precision.
#[derive(Debug, Clone, Copy)]
pub struct FixedRatioPolicy {
    collateral_per_unit: NonZeroU64,
}

impl FixedRatioPolicy {
    pub const DEFAULT_RATIO: NonZeroU64 = match NonZeroU64::new(5) {
        Some(ratio) => ratio,
        None => unreachable!(),
    };

    pub fn new(collateral_per_unit: NonZeroU64) -> Self {
        Self {
            collateral_per_unit,
        }
    }

    pub fn ratio(&self) -> u64 {
        self.collateral_per_unit.get()
    }

    /// `deposit * 10^borrow_decimals / (ratio * 10^collateral_decimals)`
    pub fn compute(
        &self,
        deposit: U256,
        collateral_decimals: u8,
        borrow_decimals: u8,
    ) -> Result<U256, PolicyError> {
        let scale_up = pow10(borrow_decimals).map_err(|_| PolicyError::Overflow)?;
        let scale_down = pow10(collateral_decimals).map_err(|_| PolicyError::Overflow)?;

        let numerator = deposit.checked_mul(scale_up).ok_or(PolicyError::Overflow)?;
        let denominator = scale_down
            .checked_mul(U256::from(self.ratio()))
            .ok_or(PolicyError::Overflow)?;
        Ok(numerator / denominator)
    }
}

impl Default for FixedRatioPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RATIO)
    }
}

#[async_trait]
impl BorrowPolicy for FixedRatioPolicy {
    fn name(&self) -> &'static str {
        "fixed-ratio"
    }

    fn reads_liquidity(&self) -> bool {
        false
    }

    async fn borrow_amount(&self, ctx: BorrowContext<'_>) -> Result<BorrowDecision, PolicyError> {
        let borrow_decimals = ctx.contracts.borrow_token.decimals().await?;
        let amount = self.compute(ctx.deposit, ctx.collateral_decimals, borrow_decimals)?;
        if amount.is_zero() {
            return Err(PolicyError::DepositTooSmall {
                deposit: ctx.deposit,
                ratio: self.ratio(),
            });
        }
        Ok(BorrowDecision {
            amount,
            liquidity: None,
        })
    }
}

//-----------------------------------------------------------------------------
// Configuration
//-----------------------------------------------------------------------------

/// Serializable policy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BorrowPolicyConfig {
    #[default]
    AccountLiquidity,
    FixedRatio {
        #[serde(default = "default_ratio")]
        collateral_per_unit: NonZeroU64,
    },
}

fn default_ratio() -> NonZeroU64 {
    FixedRatioPolicy::DEFAULT_RATIO
}

impl BorrowPolicyConfig {
    pub fn build(&self) -> Box<dyn BorrowPolicy> {
        match self {
            BorrowPolicyConfig::AccountLiquidity => Box::new(AccountLiquidityPolicy),
            BorrowPolicyConfig::FixedRatio {
                collateral_per_unit,
            } => Box::new(FixedRatioPolicy::new(*collateral_per_unit)),
        }
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------
