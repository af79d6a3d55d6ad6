use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::CategoryId;
use super::money::Money;

/// How an expense was paid. The spelling of the serialized form matches the
/// values stored by the ingestion pipeline (`CREDIT_CARD`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    BankTransfer,
    Cash,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::CreditCard => write!(f, "CREDIT_CARD"),
            PaymentMethod::DebitCard => write!(f, "DEBIT_CARD"),
            PaymentMethod::BankTransfer => write!(f, "BANK_TRANSFER"),
            PaymentMethod::Cash => write!(f, "CASH"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT_CARD" => Ok(PaymentMethod::CreditCard),
            "DEBIT_CARD" => Ok(PaymentMethod::DebitCard),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "CASH" => Ok(PaymentMethod::Cash),
            other => Err(format!("Unknown payment method: '{other}'")),
        }
    }
}

/// An expense record, as seen by the engine. Persistence identity and
/// timestamps live with the storage collaborator.
///
/// Invariants:
/// - `billing_date` is always present; it is derived from `transaction_date`
///   and `payment_method` unless the caller overrides it.
/// - `auto_categorized` implies `confidence_score` is `Some` and in [0, 1];
///   a manually set category clears both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Option<i64>,
    pub amount: Money,
    pub merchant: String,
    pub description: Option<String>,
    pub transaction_date: DateTime<FixedOffset>,
    pub category_id: Option<CategoryId>,
    pub payment_method: PaymentMethod,
    /// When the expense affects the budget. For credit cards this is the next
    /// statement day, not the purchase day.
    pub billing_date: DateTime<FixedOffset>,
    pub card_last_four: Option<String>,
    /// Ingest provenance (which mailbox the source email came from).
    pub source_email: Option<String>,
    /// Original source text, kept for re-parsing.
    pub raw_data: Option<String>,
    pub auto_categorized: bool,
    pub confidence_score: Option<f64>,
}

impl Expense {
    /// A new uncategorized expense. `billing_date` starts equal to the
    /// transaction date; callers run the billing cycle calculator to defer it.
    pub fn new(
        merchant: &str,
        amount: Money,
        transaction_date: DateTime<FixedOffset>,
        payment_method: PaymentMethod,
    ) -> Self {
        Expense {
            id: None,
            amount,
            merchant: merchant.to_string(),
            description: None,
            transaction_date,
            category_id: None,
            payment_method,
            billing_date: transaction_date,
            card_last_four: None,
            source_email: None,
            raw_data: None,
            auto_categorized: false,
            confidence_score: None,
        }
    }

    pub fn is_categorized(&self) -> bool {
        self.category_id.is_some()
    }

    /// Record an automatic categorization result.
    pub fn set_auto_category(&mut self, category_id: CategoryId, confidence: f64) {
        self.category_id = Some(category_id);
        self.auto_categorized = true;
        self.confidence_score = Some(confidence);
    }

    /// Drop the category, returning the expense to the uncategorized pool.
    pub fn clear_category(&mut self) {
        self.category_id = None;
        self.auto_categorized = false;
        self.confidence_score = None;
    }

    /// Merge explicit field overrides into this expense. A manually supplied
    /// category marks the expense as no longer auto-categorized.
    pub fn apply_update(&mut self, update: ExpenseUpdate) {
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(merchant) = update.merchant {
            self.merchant = merchant;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(transaction_date) = update.transaction_date {
            self.transaction_date = transaction_date;
        }
        if let Some(payment_method) = update.payment_method {
            self.payment_method = payment_method;
        }
        if let Some(billing_date) = update.billing_date {
            self.billing_date = billing_date;
        }
        if let Some(card_last_four) = update.card_last_four {
            self.card_last_four = Some(card_last_four);
        }
        if let Some(category_id) = update.category_id {
            self.category_id = Some(category_id);
            self.auto_categorized = false;
            self.confidence_score = None;
        }
    }
}

/// Optional field overrides for [`Expense::apply_update`]. `None` means
/// "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    pub amount: Option<Money>,
    pub merchant: Option<String>,
    pub description: Option<String>,
    pub transaction_date: Option<DateTime<FixedOffset>>,
    pub category_id: Option<CategoryId>,
    pub payment_method: Option<PaymentMethod>,
    pub billing_date: Option<DateTime<FixedOffset>>,
    pub card_last_four: Option<String>,
}
