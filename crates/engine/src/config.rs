use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::billing::{BillingCycle, BillingError, DEFAULT_BILLING_DAY};
use crate::rules::{CategoryMatcher, MerchantRule, DEFAULT_FUZZY_THRESHOLD};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Billing(#[from] BillingError),
}

/// Engine settings plus the rule list, as deployed configuration. This is
/// the composition boundary: callers build one per tenant (billing days
/// differ between card issuers) instead of sharing a process-wide instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_billing_day")]
    pub billing_day: u32,
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: u8,
    #[serde(default)]
    pub rules: Vec<MerchantRule>,
}

fn default_billing_day() -> u32 {
    DEFAULT_BILLING_DAY
}

fn default_fuzzy_threshold() -> u8 {
    DEFAULT_FUZZY_THRESHOLD
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            billing_day: default_billing_day(),
            fuzzy_threshold: default_fuzzy_threshold(),
            rules: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Construct both engine components. Consumes the rule list; the matcher
    /// compiles and orders it once.
    pub fn build(self) -> Result<(CategoryMatcher, BillingCycle), ConfigError> {
        let cycle = BillingCycle::new(self.billing_day)?;
        let matcher = CategoryMatcher::new(self.rules).with_fuzzy_threshold(self.fuzzy_threshold);
        Ok((matcher, cycle))
    }
}
