//! Network configuration types
//!
//! A [`NetworkConfig`] is the raw, compiled-in description of one deployment:
//! every role maps to an address string, and an empty string means the
//! contract is not deployed on that chain. [`LendingMarkets`] is the checked
//! form the loan workflow binds clients against.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::Serialize;

use crate::error::{NetworkError, NetworkResult};

//-----------------------------------------------------------------------------
// Contract Roles
//-----------------------------------------------------------------------------

/// Named contract roles within a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractRole {
    /// Lending-pool controller (the unitroller proxy)
    Controller,
    /// Asset deposited as collateral
    CollateralToken,
    /// Receipt token minted against the collateral
    CollateralReceiptToken,
    /// Asset borrowed against the collateral
    BorrowToken,
    /// Receipt token market the borrow is taken from
    BorrowReceiptToken,
    PriceOracle,
    Governance,
    Timelock,
    InterestRateModel,
    /// Controller implementation behind the unitroller
    ComptrollerImplementation,
    Maximillion,
}

impl ContractRole {
    /// Roles that must be deployed for a loan to be possible
    pub const MANDATORY: [ContractRole; 5] = [
        ContractRole::Controller,
        ContractRole::CollateralToken,
        ContractRole::CollateralReceiptToken,
        ContractRole::BorrowToken,
        ContractRole::BorrowReceiptToken,
    ];

    /// Roles that may be left empty
    pub const OPTIONAL: [ContractRole; 6] = [
        ContractRole::PriceOracle,
        ContractRole::Governance,
        ContractRole::Timelock,
        ContractRole::InterestRateModel,
        ContractRole::ComptrollerImplementation,
        ContractRole::Maximillion,
    ];

    pub fn is_mandatory(&self) -> bool {
        Self::MANDATORY.contains(self)
    }
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractRole::Controller => "controller",
            ContractRole::CollateralToken => "collateral token",
            ContractRole::CollateralReceiptToken => "collateral receipt token",
            ContractRole::BorrowToken => "borrow token",
            ContractRole::BorrowReceiptToken => "borrow receipt token",
            ContractRole::PriceOracle => "price oracle",
            ContractRole::Governance => "governance",
            ContractRole::Timelock => "timelock",
            ContractRole::InterestRateModel => "interest rate model",
            ContractRole::ComptrollerImplementation => "comptroller implementation",
            ContractRole::Maximillion => "maximillion",
        };
        f.write_str(name)
    }
}

//-----------------------------------------------------------------------------
// Raw Network Configuration
//-----------------------------------------------------------------------------

/// Contract addresses of one lending deployment, as compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    /// Human readable network name
    pub name: &'static str,

    pub controller: &'static str,
    pub collateral_token: &'static str,
    pub collateral_receipt_token: &'static str,
    pub borrow_token: &'static str,
    pub borrow_receipt_token: &'static str,

    pub price_oracle: &'static str,
    pub governance: &'static str,
    pub timelock: &'static str,
    pub interest_rate_model: &'static str,
    pub comptroller_implementation: &'static str,
    pub maximillion: &'static str,
}

impl NetworkConfig {
    /// An entry for a chain the protocol has not been deployed to yet.
    pub const fn placeholder(chain_id: u64, name: &'static str) -> Self {
        Self {
            chain_id,
            name,
            controller: "",
            collateral_token: "",
            collateral_receipt_token: "",
            borrow_token: "",
            borrow_receipt_token: "",
            price_oracle: "",
            governance: "",
            timelock: "",
            interest_rate_model: "",
            comptroller_implementation: "",
            maximillion: "",
        }
    }

    /// Raw address string for a role (empty when not deployed)
    pub fn address_str(&self, role: ContractRole) -> &'static str {
        match role {
            ContractRole::Controller => self.controller,
            ContractRole::CollateralToken => self.collateral_token,
            ContractRole::CollateralReceiptToken => self.collateral_receipt_token,
            ContractRole::BorrowToken => self.borrow_token,
            ContractRole::BorrowReceiptToken => self.borrow_receipt_token,
            ContractRole::PriceOracle => self.price_oracle,
            ContractRole::Governance => self.governance,
            ContractRole::Timelock => self.timelock,
            ContractRole::InterestRateModel => self.interest_rate_model,
            ContractRole::ComptrollerImplementation => self.comptroller_implementation,
            ContractRole::Maximillion => self.maximillion,
        }
    }

    /// Mandatory roles with an empty address
    pub fn missing_roles(&self) -> Vec<ContractRole> {
        ContractRole::MANDATORY
            .into_iter()
            .filter(|role| self.address_str(*role).trim().is_empty())
            .collect()
    }

    /// Whether every mandatory role has an address
    pub fn is_complete(&self) -> bool {
        self.missing_roles().is_empty()
    }

    /// Parsed address of a role, `Ok(None)` when the role is not deployed.
    pub fn address(&self, role: ContractRole) -> NetworkResult<Option<Address>> {
        let raw = self.address_str(role).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        Address::from_str(raw)
            .map(Some)
            .map_err(|_| NetworkError::InvalidAddress {
                chain_id: self.chain_id,
                role,
                value: raw.to_string(),
            })
    }

    /// Validate the mandatory roles and return the typed market addresses.
    ///
    /// All missing roles are reported together; malformed addresses are
    /// reported one at a time.
    pub fn markets(&self) -> NetworkResult<LendingMarkets> {
        let missing = self.missing_roles();
        if !missing.is_empty() {
            return Err(NetworkError::IncompleteConfig {
                chain_id: self.chain_id,
                missing,
            });
        }

        let required = |role| {
            self.address(role)?
                .ok_or_else(|| NetworkError::IncompleteConfig {
                    chain_id: self.chain_id,
                    missing: vec![role],
                })
        };

        Ok(LendingMarkets {
            chain_id: self.chain_id,
            controller: required(ContractRole::Controller)?,
            collateral_token: required(ContractRole::CollateralToken)?,
            collateral_receipt_token: required(ContractRole::CollateralReceiptToken)?,
            borrow_token: required(ContractRole::BorrowToken)?,
            borrow_receipt_token: required(ContractRole::BorrowReceiptToken)?,
        })
    }
}

//-----------------------------------------------------------------------------
// Validated Markets
//-----------------------------------------------------------------------------

/// Typed addresses of the five contracts a loan interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LendingMarkets {
    pub chain_id: u64,
    pub controller: Address,
    pub collateral_token: Address,
    pub collateral_receipt_token: Address,
    pub borrow_token: Address,
    pub borrow_receipt_token: Address,
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployments::{BSC_TESTNET, KOVAN};

    #[test]
    fn test_complete_config_yields_markets() {
        let markets = KOVAN.markets().unwrap();
        assert_eq!(markets.chain_id, 42);
        assert_eq!(
            markets.collateral_token,
            Address::from_str("0xd35f5965B4B84382ca27072fF3B6b42e7053e672").unwrap()
        );
        assert_ne!(markets.collateral_receipt_token, markets.borrow_receipt_token);
    }

    #[test]
    fn test_placeholder_reports_every_missing_role() {
        let config = NetworkConfig::placeholder(1, "mainnet");
        assert!(!config.is_complete());

        match config.markets() {
            Err(NetworkError::IncompleteConfig { chain_id, missing }) => {
                assert_eq!(chain_id, 1);
                assert_eq!(missing, ContractRole::MANDATORY.to_vec());
            }
            other => panic!("expected incomplete config, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_roles_may_be_empty() {
        assert!(BSC_TESTNET.is_complete());
        assert_eq!(BSC_TESTNET.address(ContractRole::PriceOracle), Ok(None));
        assert!(BSC_TESTNET.markets().is_ok());
    }

    #[test]
    fn test_malformed_address_is_rejected() {
        let config = NetworkConfig {
            borrow_token: "0xnot-an-address",
            ..KOVAN
        };
        assert_eq!(
            config.markets(),
            Err(NetworkError::InvalidAddress {
                chain_id: 42,
                role: ContractRole::BorrowToken,
                value: "0xnot-an-address".to_string(),
            })
        );
    }

    #[test]
    fn test_single_missing_role_message() {
        let config = NetworkConfig {
            controller: "",
            ..KOVAN
        };
        let err = config.markets().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Chain id 42 is missing mandatory addresses: controller"
        );
    }

    #[test]
    fn test_json_form_of_configs_and_markets() {
        assert_eq!(
            serde_json::to_value(ContractRole::CollateralReceiptToken).unwrap(),
            "collateral_receipt_token"
        );

        let placeholder = serde_json::to_value(NetworkConfig::placeholder(5, "goerli")).unwrap();
        assert_eq!(placeholder["chain_id"], 5);
        assert_eq!(placeholder["name"], "goerli");
        assert_eq!(placeholder["controller"], "");

        let markets = KOVAN.markets().unwrap();
        let json = serde_json::to_value(markets).unwrap();
        assert_eq!(json["chain_id"], 42);
        for (field, expected) in [
            ("controller", markets.controller),
            ("collateral_token", markets.collateral_token),
            ("borrow_receipt_token", markets.borrow_receipt_token),
        ] {
            let rendered = json[field].as_str().unwrap();
            assert_eq!(Address::from_str(rendered).unwrap(), expected);
        }
    }
}
