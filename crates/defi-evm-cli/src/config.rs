//! CLI configuration file
//!
//! An optional TOML file supplies defaults for the loan command. Values given
//! on the command line or through the environment always win.
//!
//! ```toml
//! chain_id = 42
//! rpc_url = "https://kovan.example.org"
//! log_level = "defi_evm_loan=debug,info"
//! json_logs = false
//!
//! [loan]
//! confirmation_timeout_secs = 300
//!
//! [loan.borrow_policy]
//! kind = "fixed-ratio"
//! collateral_per_unit = 5
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use defi_evm_loan::LoanOptions;

/// Chain used when neither flags nor the file name one
pub const DEFAULT_CHAIN_ID: u64 = 42;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub chain_id: Option<u64>,
    pub rpc_url: Option<String>,
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
    pub loan: LoanOptions,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load `path` if given, otherwise use an empty configuration.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map(Self::load).transpose().map(Option::unwrap_or_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defi_evm_loan::BorrowPolicyConfig;

    #[test]
    fn test_empty_config() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.loan, LoanOptions::default());
    }

    #[test]
    fn test_nested_loan_options() {
        let config: CliConfig = toml::from_str(
            r#"
            chain_id = 97
            [loan]
            confirmation_timeout_secs = 30
            [loan.borrow_policy]
            kind = "fixed-ratio"
            collateral_per_unit = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.chain_id, Some(97));
        assert_eq!(config.loan.confirmation_timeout_secs, 30);
        assert!(matches!(
            config.loan.borrow_policy,
            BorrowPolicyConfig::FixedRatio { collateral_per_unit } if collateral_per_unit.get() == 4
        ));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<CliConfig>("private_key = \"0x00\"").is_err());
    }
}
