//! Loan workflow tests
//!
//! Every scenario runs the real step sequence against the in-memory chain,
//! so no node or network access is needed.

use std::time::Duration;

use alloy::primitives::{Address, U256};

use defi_evm_loan::mock::{MockCallKind, MockChain};
use defi_evm_loan::networks::{chain, NetworkRegistry};
use defi_evm_loan::{
    AccountLiquidity, BorrowPolicyConfig, FixedRatioPolicy, LoanOptions, LoanStep, LoanWorkflow,
    OutcomeCode,
};

use MockCallKind::{Approve, Borrow, EnterMarkets, Mint};

fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

/// Kovan deployment with whole-unit tokens and 1000 collateral for alice
fn kovan() -> (NetworkRegistry, MockChain) {
    let registry = NetworkRegistry::builtin();
    let markets = registry.resolve(chain::KOVAN).unwrap();
    let chain = MockChain::new(markets);
    let markets = chain.markets().clone();
    chain
        .set_decimals(markets.collateral_token, 0)
        .set_decimals(markets.borrow_token, 0)
        .set_balance(markets.collateral_token, alice(), U256::from(1000));
    (registry, chain)
}

#[tokio::test]
async fn test_unsupported_chain_never_binds() {
    let (registry, chain) = kovan();
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow.execute(&chain.binder(alice()), 999, None).await;

    assert_eq!(result.outcome, OutcomeCode::UnsupportedChain);
    assert_eq!(result.last_completed_step, None);
    assert_eq!(chain.bind_count(), 0);
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_incomplete_chain_never_binds() {
    let (registry, chain) = kovan();
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::MAINNET, None)
        .await;

    assert_eq!(result.outcome, OutcomeCode::IncompleteConfiguration);
    assert_eq!(chain.bind_count(), 0);
}

#[tokio::test]
async fn test_endpoint_on_wrong_chain_is_invalid_input() {
    let (registry, chain) = kovan();
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::BSC_TESTNET, None)
        .await;

    assert_eq!(result.outcome, OutcomeCode::InvalidInput);
    assert_eq!(result.last_completed_step, Some(LoanStep::ResolveConfiguration));
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_full_balance_borrows_full_liquidity() {
    let (registry, chain) = kovan();
    let markets = chain.markets().clone();
    chain.set_liquidity(alice(), AccountLiquidity::healthy(U256::from(500)));
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, None)
        .await;

    assert!(result.is_success(), "{}", result.message);
    assert_eq!(result.last_completed_step, Some(LoanStep::Report));
    assert_eq!(
        result.message,
        "Successfully borrowed 500.0. Your current borrow token balance is: 500.0"
    );

    let summary = result.summary.unwrap();
    assert_eq!(summary.account, alice());
    assert_eq!(summary.deposited_units, U256::from(1000));
    assert_eq!(summary.borrowed_units, U256::from(500));
    assert_eq!(summary.borrow_balance_units, U256::from(500));
    assert_eq!(summary.remaining_liquidity_usd.as_deref(), Some("0.0"));
    assert!(summary
        .explorer_link
        .starts_with("https://kovan.etherscan.io/tx/0x"));

    assert_eq!(
        chain.submissions_for(alice()),
        vec![EnterMarkets, Approve, Mint, Borrow]
    );
    assert_eq!(
        chain.entered_markets(alice()),
        vec![markets.collateral_receipt_token, markets.borrow_receipt_token]
    );
    assert_eq!(chain.balance(markets.collateral_token, alice()), U256::ZERO);
    assert_eq!(
        chain.balance(markets.collateral_receipt_token, alice()),
        U256::from(1000)
    );
}

#[tokio::test]
async fn test_requested_amount_is_scaled_by_token_decimals() {
    let (registry, chain) = kovan();
    let markets = chain.markets().clone();
    let held = U256::from(10u64).pow(U256::from(19));
    chain
        .set_decimals(markets.collateral_token, 18)
        .set_balance(markets.collateral_token, alice(), held)
        .set_liquidity(alice(), AccountLiquidity::healthy(U256::from(7)));
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, Some("2.5"))
        .await;

    assert!(result.is_success(), "{}", result.message);
    let summary = result.summary.unwrap();
    assert_eq!(
        summary.deposited_units,
        U256::from(25u64) * U256::from(10u64).pow(U256::from(17))
    );
    assert_eq!(summary.deposited, "2.5");
    let approved = chain
        .calls_for(alice())
        .into_iter()
        .find(|call| call.kind == Approve)
        .and_then(|call| call.amount);
    assert_eq!(approved, Some(summary.deposited_units));
}

#[tokio::test]
async fn test_insufficient_balance_submits_nothing() {
    let (registry, chain) = kovan();
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, Some("1500"))
        .await;

    assert_eq!(result.outcome, OutcomeCode::InsufficientBalance);
    assert_eq!(
        result.message,
        "Collateral balance of: 1000.0 is less than desired deposit of: 1500.0"
    );
    assert_eq!(result.last_completed_step, Some(LoanStep::BindContext));
    assert!(!result.is_partial());
    assert!(chain.submissions_for(alice()).is_empty());
}

#[tokio::test]
async fn test_fixed_ratio_borrows_one_fifth() {
    let (registry, chain) = kovan();
    let options = LoanOptions::default().with_borrow_policy(BorrowPolicyConfig::FixedRatio {
        collateral_per_unit: FixedRatioPolicy::DEFAULT_RATIO,
    });
    let workflow = LoanWorkflow::new(&registry, options);

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, None)
        .await;

    assert!(result.is_success(), "{}", result.message);
    let summary = result.summary.unwrap();
    assert_eq!(summary.borrowed_units, U256::from(200));
    assert_eq!(summary.remaining_liquidity_usd, None);
    assert!(chain
        .calls_for(alice())
        .iter()
        .all(|call| call.kind != MockCallKind::AccountLiquidity));
}

#[tokio::test]
async fn test_fixed_ratio_deposit_below_ratio_stops_before_borrow() {
    let (registry, chain) = kovan();
    let markets = chain.markets().clone();
    chain.set_balance(markets.collateral_token, alice(), U256::from(4));
    let options = LoanOptions::default().with_borrow_policy(BorrowPolicyConfig::FixedRatio {
        collateral_per_unit: FixedRatioPolicy::DEFAULT_RATIO,
    });
    let workflow = LoanWorkflow::new(&registry, options);

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, None)
        .await;

    assert_eq!(result.outcome, OutcomeCode::AccountLiquidity);
    assert!(result.message.contains("too small"));
    assert_eq!(result.last_completed_step, Some(LoanStep::Mint));
    assert!(result.is_partial());
    assert_eq!(
        chain.submissions_for(alice()),
        vec![EnterMarkets, Approve, Mint]
    );
}

#[tokio::test]
async fn test_zero_liquidity_stops_before_borrow() {
    let (registry, chain) = kovan();
    chain.set_liquidity(
        alice(),
        AccountLiquidity {
            error_code: U256::ZERO,
            liquidity: U256::ZERO,
            shortfall: U256::from(7),
        },
    );
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, None)
        .await;

    assert_eq!(result.outcome, OutcomeCode::AccountLiquidity);
    assert!(result.message.contains("Current shortfall is: 7"));
    assert_eq!(result.last_completed_step, Some(LoanStep::Mint));
    assert!(result.is_partial());
    assert_eq!(
        chain.submissions_for(alice()),
        vec![EnterMarkets, Approve, Mint]
    );
}

#[tokio::test]
async fn test_liquidity_error_code_is_contract_return_error() {
    let (registry, chain) = kovan();
    chain.set_liquidity(
        alice(),
        AccountLiquidity {
            error_code: U256::from(3),
            liquidity: U256::from(500),
            shortfall: U256::ZERO,
        },
    );
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, None)
        .await;

    assert_eq!(result.outcome, OutcomeCode::ContractReturnError);
    assert!(!chain.submissions_for(alice()).contains(&Borrow));
}

#[tokio::test]
async fn test_failed_approval_reports_entered_markets() {
    let (registry, chain) = kovan();
    chain
        .set_liquidity(alice(), AccountLiquidity::healthy(U256::from(500)))
        .fail_on(Approve);
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, None)
        .await;

    assert_eq!(result.outcome, OutcomeCode::TransactionError);
    assert_eq!(result.last_completed_step, Some(LoanStep::EnterMarkets));
    assert!(result
        .message
        .ends_with("(last completed step: enter markets)"));
    assert!(result.tx_hash.is_some());
    assert_eq!(chain.submissions_for(alice()), vec![EnterMarkets, Approve]);
}

#[tokio::test]
async fn test_reverted_mint_keeps_collateral() {
    let (registry, chain) = kovan();
    let markets = chain.markets().clone();
    chain
        .set_liquidity(alice(), AccountLiquidity::healthy(U256::from(500)))
        .revert_on(Mint);
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, None)
        .await;

    assert_eq!(result.outcome, OutcomeCode::TransactionError);
    assert!(result.message.contains("reverted"));
    assert_eq!(result.last_completed_step, Some(LoanStep::Approve));
    assert_eq!(
        chain.balance(markets.collateral_token, alice()),
        U256::from(1000)
    );
}

#[tokio::test]
async fn test_failed_report_after_borrow_is_partial() {
    let (registry, chain) = kovan();
    let markets = chain.markets().clone();
    chain
        .set_liquidity(alice(), AccountLiquidity::healthy(U256::from(500)))
        .fail_on_contract(markets.borrow_token);
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, None)
        .await;

    assert_eq!(result.outcome, OutcomeCode::TransactionError);
    assert_eq!(result.last_completed_step, Some(LoanStep::Borrow));
    assert!(result.is_partial());
    assert!(result.message.ends_with("(last completed step: borrow)"));
    assert!(result.tx_hash.is_some());
    assert!(result.summary.is_none());
    // The borrow itself went through
    assert_eq!(chain.balance(markets.borrow_token, alice()), U256::from(500));
    assert_eq!(
        chain.submissions_for(alice()),
        vec![EnterMarkets, Approve, Mint, Borrow]
    );
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_borrow_times_out() {
    let (registry, chain) = kovan();
    chain
        .set_liquidity(alice(), AccountLiquidity::healthy(U256::from(500)))
        .stall_on(Borrow);
    let options = LoanOptions::default().with_confirmation_timeout(Duration::from_secs(5));
    let workflow = LoanWorkflow::new(&registry, options);

    let result = workflow
        .execute(&chain.binder(alice()), chain::KOVAN, None)
        .await;

    assert_eq!(result.outcome, OutcomeCode::Timeout);
    assert!(result.message.contains("no response within 5s"));
    assert_eq!(result.last_completed_step, Some(LoanStep::Mint));
}

#[tokio::test]
async fn test_concurrent_loans_for_different_accounts() {
    let (registry, chain) = kovan();
    let markets = chain.markets().clone();
    chain
        .set_balance(markets.collateral_token, bob(), U256::from(600))
        .set_liquidity(alice(), AccountLiquidity::healthy(U256::from(300)))
        .set_liquidity(bob(), AccountLiquidity::healthy(U256::from(400)));
    let workflow = LoanWorkflow::new(&registry, LoanOptions::default());

    let alice_binder = chain.binder(alice());
    let bob_binder = chain.binder(bob());
    let (for_alice, for_bob) = tokio::join!(
        workflow.execute(&alice_binder, chain::KOVAN, None),
        workflow.execute(&bob_binder, chain::KOVAN, None),
    );

    let alice_summary = for_alice.summary.unwrap();
    let bob_summary = for_bob.summary.unwrap();
    assert_eq!(alice_summary.account, alice());
    assert_eq!(alice_summary.deposited_units, U256::from(1000));
    assert_eq!(alice_summary.borrowed_units, U256::from(300));
    assert_eq!(bob_summary.account, bob());
    assert_eq!(bob_summary.deposited_units, U256::from(600));
    assert_eq!(bob_summary.borrowed_units, U256::from(400));

    for account in [alice(), bob()] {
        assert_eq!(
            chain.submissions_for(account),
            vec![EnterMarkets, Approve, Mint, Borrow]
        );
    }
    assert_eq!(chain.bind_count(), 2);
}
