//! Expense categorization and billing-cycle engine.
//!
//! Two stateless computation components, invoked synchronously by the web
//! layer: [`CategoryMatcher`] scores merchant strings against user-defined
//! rules, and [`BillingCycle`] maps transaction dates to the billing period
//! they are budgeted in. Both only read their inputs and return values, so
//! they are safe to share across request handlers without locking.

pub mod analytics;
pub mod billing;
pub mod config;
pub mod rules;
pub(crate) mod util;

pub use analytics::{expense_summary, ExpenseSummary};
pub use billing::{
    detect_payment_method, extract_card_last_four, BillingCycle, BillingError, BillingSummary,
    MethodBucket, DEFAULT_BILLING_DAY,
};
pub use config::{ConfigError, EngineConfig};
pub use rules::{
    CategoryMatcher, MatchResult, MerchantRule, RecategorizeOutcome, RuleSuggestion,
    DEFAULT_FUZZY_THRESHOLD,
};
