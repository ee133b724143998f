//! Loan command configuration tests
//!
//! Verifies how flags, environment values and the TOML file combine into a
//! loan request. Nothing here talks to a node.

use std::io::Write;
use std::num::NonZeroU64;
use std::time::Duration;

use anyhow::Result;
use tempfile::NamedTempFile;

use defi_evm_cli::{CliConfig, LoanCommand, PolicyKind, DEFAULT_CHAIN_ID};
use defi_evm_loan::{endpoint_label, BorrowPolicyConfig, LoanOptions};

const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn config_file(contents: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

fn base_command() -> LoanCommand {
    LoanCommand {
        private_key: Some(KEY.to_string()),
        ..LoanCommand::default()
    }
}

#[test]
fn test_file_values_fill_missing_flags() -> Result<()> {
    let file = config_file(
        r#"
        chain_id = 97
        rpc_url = "http://localhost:8545"

        [loan]
        confirmation_timeout_secs = 300
        "#,
    )?;
    let config = CliConfig::load(file.path())?;

    let (request, options) = base_command().resolve(&config)?;
    assert_eq!(request.chain_id, 97);
    assert_eq!(request.rpc_url, "http://localhost:8545");
    assert_eq!(request.deposit_amount, None);
    assert_eq!(options.confirmation_timeout(), Duration::from_secs(300));
    assert_eq!(options.borrow_policy, BorrowPolicyConfig::AccountLiquidity);
    Ok(())
}

#[test]
fn test_flags_override_file() -> Result<()> {
    let file = config_file(
        r#"
        chain_id = 97
        rpc_url = "http://localhost:8545"

        [loan.borrow_policy]
        kind = "fixed-ratio"
        collateral_per_unit = 4
        "#,
    )?;
    let config = CliConfig::load(file.path())?;

    let command = LoanCommand {
        rpc_url: Some("http://127.0.0.1:9545".to_string()),
        chain_id: Some(42),
        amount: Some("12.5".to_string()),
        policy: Some(PolicyKind::AccountLiquidity),
        timeout_secs: Some(10),
        ..base_command()
    };
    let (request, options) = command.resolve(&config)?;
    assert_eq!(request.chain_id, 42);
    assert_eq!(request.rpc_url, "http://127.0.0.1:9545");
    assert_eq!(request.deposit_amount.as_deref(), Some("12.5"));
    assert_eq!(options.confirmation_timeout_secs, 10);
    assert_eq!(options.borrow_policy, BorrowPolicyConfig::AccountLiquidity);
    Ok(())
}

#[test]
fn test_ratio_flag_selects_fixed_ratio() -> Result<()> {
    let config = CliConfig {
        rpc_url: Some("http://localhost:8545".to_string()),
        ..CliConfig::default()
    };

    let command = LoanCommand {
        ratio: Some(8),
        ..base_command()
    };
    let (request, options) = command.resolve(&config)?;
    assert_eq!(request.chain_id, DEFAULT_CHAIN_ID);
    assert_eq!(
        options.borrow_policy,
        BorrowPolicyConfig::FixedRatio {
            collateral_per_unit: NonZeroU64::new(8).unwrap()
        }
    );

    let command = LoanCommand {
        policy: Some(PolicyKind::FixedRatio),
        ..base_command()
    };
    let (_, options) = command.resolve(&config)?;
    assert_eq!(
        options.borrow_policy,
        BorrowPolicyConfig::FixedRatio {
            collateral_per_unit: NonZeroU64::new(5).unwrap()
        }
    );
    Ok(())
}

#[test]
fn test_missing_inputs_are_errors() {
    let config = CliConfig::default();

    let no_key = LoanCommand {
        rpc_url: Some("http://localhost:8545".to_string()),
        ..LoanCommand::default()
    };
    assert!(no_key.resolve(&config).is_err());

    let no_endpoint = base_command();
    assert!(no_endpoint.resolve(&config).is_err());

    let contradictory = LoanCommand {
        rpc_url: Some("http://localhost:8545".to_string()),
        policy: Some(PolicyKind::AccountLiquidity),
        ratio: Some(3),
        ..base_command()
    };
    assert!(contradictory.resolve(&config).is_err());
}

#[test]
fn test_zero_timeout_is_rejected() -> Result<()> {
    let command = LoanCommand {
        rpc_url: Some("http://localhost:8545".to_string()),
        timeout_secs: Some(0),
        ..base_command()
    };
    assert!(command.resolve(&CliConfig::default()).is_err());

    let file = config_file("[loan]\nconfirmation_timeout_secs = 0")?;
    assert!(CliConfig::load(file.path()).is_err());
    Ok(())
}

#[test]
fn test_logged_endpoint_keeps_credentials_out() -> Result<()> {
    let config = CliConfig {
        rpc_url: Some("https://kovan.infura.io/v3/0123456789abcdef".to_string()),
        ..CliConfig::default()
    };
    let (request, _) = base_command().resolve(&config)?;
    // The request keeps the full URL for connecting; only its label is shown.
    assert!(request.rpc_url.ends_with("0123456789abcdef"));
    assert_eq!(endpoint_label(&request.rpc_url), "https://kovan.infura.io");
    Ok(())
}

#[test]
fn test_malformed_config_file_is_rejected() -> Result<()> {
    let file = config_file("chain_id = \"kovan\"")?;
    assert!(CliConfig::load(file.path()).is_err());
    assert!(CliConfig::load_optional(None)?.loan == LoanOptions::default());
    Ok(())
}
