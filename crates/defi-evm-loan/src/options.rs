//! Configuration for the loan workflow

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::policy::BorrowPolicyConfig;

/// Options passed explicitly to each workflow invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanOptions {
    /// Upper bound in seconds on each remote read and on each transaction's
    /// submission plus confirmation. At least 1.
    #[serde(deserialize_with = "positive_secs")]
    pub confirmation_timeout_secs: u64,

    /// How the borrow amount is decided
    pub borrow_policy: BorrowPolicyConfig,
}

impl LoanOptions {
    pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs.max(1))
    }

    pub fn with_borrow_policy(mut self, borrow_policy: BorrowPolicyConfig) -> Self {
        self.borrow_policy = borrow_policy;
        self
    }

    /// Set the bound, rounded up to whole seconds.
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.confirmation_timeout_secs = secs.max(1);
        self
    }
}

impl Default for LoanOptions {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: Self::DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            borrow_policy: BorrowPolicyConfig::default(),
        }
    }
}

fn positive_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    if secs == 0 {
        return Err(<D::Error as serde::de::Error>::custom(
            "confirmation_timeout_secs must be at least 1",
        ));
    }
    Ok(secs)
}
