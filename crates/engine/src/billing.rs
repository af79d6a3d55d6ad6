use std::sync::OnceLock;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gasto_core::{DateRange, Expense, Money, PaymentMethod};

/// Statement day used when no billing day has been configured.
pub const DEFAULT_BILLING_DAY: u32 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("Billing day must be between 1 and 31, got {0}")]
    InvalidBillingDay(u32),
}

/// Maps transaction dates to the billing period they are budgeted in.
///
/// Debit, transfer, and cash expenses post immediately. Credit-card expenses
/// post on the configured statement day: before the statement day they bill
/// in the same month, on or after it they roll into the next month. The
/// statement day is clamped per month, so day 31 bills on Feb 29 in a leap
/// year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCycle {
    billing_day: u32,
}

impl Default for BillingCycle {
    fn default() -> Self {
        BillingCycle {
            billing_day: DEFAULT_BILLING_DAY,
        }
    }
}

impl BillingCycle {
    pub fn new(billing_day: u32) -> Result<Self, BillingError> {
        if !(1..=31).contains(&billing_day) {
            return Err(BillingError::InvalidBillingDay(billing_day));
        }
        Ok(BillingCycle { billing_day })
    }

    pub fn billing_day(&self) -> u32 {
        self.billing_day
    }

    /// When the expense affects the budget. Only the date part ever changes;
    /// time of day and UTC offset are carried over from the transaction.
    pub fn billing_date_for(
        &self,
        transaction_date: DateTime<FixedOffset>,
        payment_method: PaymentMethod,
        _card_last_four: Option<&str>,
    ) -> DateTime<FixedOffset> {
        match payment_method {
            PaymentMethod::CreditCard => self.next_cycle(transaction_date),
            // Immediate posting.
            PaymentMethod::DebitCard | PaymentMethod::BankTransfer | PaymentMethod::Cash => {
                transaction_date
            }
        }
    }

    fn next_cycle(&self, transaction_date: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let year = transaction_date.year();
        let month = transaction_date.month();
        let day = transaction_date.day();

        // Effective statement day for the transaction's own month.
        let effective_day = self.billing_day.min(days_in_month(year, month));

        let (bill_year, bill_month, bill_day) = if day >= effective_day {
            // On or past the statement day: roll into the next month, whose
            // own length decides the clamp.
            let (next_year, next_month) = if month == 12 {
                (year + 1, 1)
            } else {
                (year, month + 1)
            };
            (
                next_year,
                next_month,
                self.billing_day.min(days_in_month(next_year, next_month)),
            )
        } else {
            (year, month, effective_day)
        };

        // Valid by construction: bill_day never exceeds the month length.
        let date = NaiveDate::from_ymd_opt(bill_year, bill_month, bill_day).unwrap();
        transaction_date
            .offset()
            .from_local_datetime(&date.and_time(transaction_date.time()))
            .unwrap()
    }

    /// Analytics over a set of expenses: per-payment-method counters plus the
    /// credit-card amount not yet billed as of `now`. `range` filters on the
    /// transaction date; an empty input yields the zero summary.
    pub fn billing_summary(
        &self,
        expenses: &[Expense],
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> BillingSummary {
        let mut summary = BillingSummary::default();

        for expense in expenses {
            if !range.contains(&expense.transaction_date) {
                continue;
            }

            summary.total.record(expense.amount);
            summary.bucket_mut(expense.payment_method).record(expense.amount);

            // Strictly after "now": expenses billing today are already due.
            if expense.payment_method == PaymentMethod::CreditCard && expense.billing_date > now {
                summary.pending_billing += expense.amount;
            }
        }

        summary
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // First of the following month, stepped back one day.
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
        .day()
}

/// Count and amount for one payment method (or the overall total).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodBucket {
    pub count: u64,
    pub amount: Money,
}

impl MethodBucket {
    fn record(&mut self, amount: Money) {
        self.count += 1;
        self.amount += amount;
    }
}

/// Fixed-shape aggregation over the four payment methods. One field per
/// method rather than a string-keyed map, so a new method is a compile error
/// here instead of a silently missing bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub credit_card: MethodBucket,
    pub debit_card: MethodBucket,
    pub bank_transfer: MethodBucket,
    pub cash: MethodBucket,
    /// Credit-card amount whose billing date is still in the future.
    pub pending_billing: Money,
    pub total: MethodBucket,
}

impl BillingSummary {
    fn bucket_mut(&mut self, method: PaymentMethod) -> &mut MethodBucket {
        match method {
            PaymentMethod::CreditCard => &mut self.credit_card,
            PaymentMethod::DebitCard => &mut self.debit_card,
            PaymentMethod::BankTransfer => &mut self.bank_transfer,
            PaymentMethod::Cash => &mut self.cash,
        }
    }
}

const CREDIT_INDICATORS: &[&str] = &["tarjeta de crédito", "credito", "compra", "cargo"];
const TRANSFER_INDICATORS: &[&str] = &["transferencia", "envío", "pago a", "envio"];
const DEBIT_INDICATORS: &[&str] = &["tarjeta de débito", "debito", "retiro", "cajero"];

/// Best-effort payment-method detection over unstructured source text (bank
/// notification emails, Spanish-language indicators). Checked in the order
/// credit, transfer, debit; indeterminate text with a card identifier present
/// resolves to a debit card, anything else is `None` and the caller picks
/// its own default.
pub fn detect_payment_method(text: &str, card_last_four: Option<&str>) -> Option<PaymentMethod> {
    let text_lower = text.to_lowercase();

    if CREDIT_INDICATORS.iter().any(|kw| text_lower.contains(kw)) {
        return Some(PaymentMethod::CreditCard);
    }
    if TRANSFER_INDICATORS.iter().any(|kw| text_lower.contains(kw)) {
        return Some(PaymentMethod::BankTransfer);
    }
    if DEBIT_INDICATORS.iter().any(|kw| text_lower.contains(kw)) {
        return Some(PaymentMethod::DebitCard);
    }
    if card_last_four.is_some() {
        return Some(PaymentMethod::DebitCard);
    }

    None
}

/// Pull a masked card identifier ("****5646" or "**** 5646") out of
/// unstructured text. `None` when no marker is present.
pub fn extract_card_last_four(text: &str) -> Option<String> {
    static MASKED_CARD: OnceLock<Regex> = OnceLock::new();
    let re = MASKED_CARD.get_or_init(|| Regex::new(r"\*{4}[-\s]?(\d{4})").unwrap());
    re.captures(text)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tz() -> FixedOffset {
        // Chile standard time.
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
        at(y, m, d, 22, 23, 0)
    }

    fn expense(
        amount_cents: i64,
        method: PaymentMethod,
        transacted: DateTime<FixedOffset>,
        billed: DateTime<FixedOffset>,
    ) -> Expense {
        let mut e = Expense::new("merchant", Money::from_cents(amount_cents), transacted, method);
        e.billing_date = billed;
        e
    }

    #[test]
    fn rejects_out_of_range_billing_day() {
        assert_eq!(BillingCycle::new(0), Err(BillingError::InvalidBillingDay(0)));
        assert_eq!(
            BillingCycle::new(32),
            Err(BillingError::InvalidBillingDay(32))
        );
        assert!(BillingCycle::new(1).is_ok());
        assert!(BillingCycle::new(31).is_ok());
    }

    #[test]
    fn non_credit_methods_bill_immediately() {
        let cycle = BillingCycle::default();
        let d = day(2024, 3, 14);
        for method in [
            PaymentMethod::DebitCard,
            PaymentMethod::BankTransfer,
            PaymentMethod::Cash,
        ] {
            assert_eq!(cycle.billing_date_for(d, method, None), d);
        }
    }

    #[test]
    fn credit_before_statement_day_bills_same_month() {
        let cycle = BillingCycle::default(); // day 25
        let billed = cycle.billing_date_for(day(2024, 1, 10), PaymentMethod::CreditCard, None);
        assert_eq!(billed, day(2024, 1, 25));
    }

    #[test]
    fn credit_on_statement_day_rolls_forward() {
        let cycle = BillingCycle::default();
        let billed = cycle.billing_date_for(day(2024, 1, 25), PaymentMethod::CreditCard, None);
        assert_eq!(billed, day(2024, 2, 25));
    }

    #[test]
    fn credit_after_statement_day_rolls_forward() {
        let cycle = BillingCycle::default();
        let billed = cycle.billing_date_for(day(2024, 1, 31), PaymentMethod::CreditCard, None);
        assert_eq!(billed, day(2024, 2, 25));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let cycle = BillingCycle::default();
        let billed = cycle.billing_date_for(day(2024, 12, 30), PaymentMethod::CreditCard, None);
        assert_eq!(billed, day(2025, 1, 25));
    }

    #[test]
    fn statement_day_clamps_to_leap_february() {
        let cycle = BillingCycle::new(31).unwrap();
        let billed = cycle.billing_date_for(day(2024, 2, 5), PaymentMethod::CreditCard, None);
        assert_eq!(billed, day(2024, 2, 29));
    }

    #[test]
    fn clamped_day_still_rolls_forward_at_month_end() {
        let cycle = BillingCycle::new(31).unwrap();
        // Feb 29 >= clamped day 29 → March, whose own clamp is 31.
        let billed = cycle.billing_date_for(day(2024, 2, 29), PaymentMethod::CreditCard, None);
        assert_eq!(billed, day(2024, 3, 31));
    }

    #[test]
    fn thirty_day_month_clamps_to_thirty() {
        let cycle = BillingCycle::new(31).unwrap();
        let billed = cycle.billing_date_for(day(2024, 4, 2), PaymentMethod::CreditCard, None);
        assert_eq!(billed, day(2024, 4, 30));
    }

    #[test]
    fn preserves_time_of_day_and_offset() {
        let cycle = BillingCycle::default();
        let transacted = at(2024, 1, 10, 22, 23, 45);
        let billed = cycle.billing_date_for(transacted, PaymentMethod::CreditCard, None);
        assert_eq!(billed.time(), transacted.time());
        assert_eq!(billed.offset(), transacted.offset());
        assert_eq!(billed.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 25).unwrap());
    }

    #[test]
    fn production_billing_day_fifteen() {
        let cycle = BillingCycle::new(15).unwrap();
        assert_eq!(
            cycle.billing_date_for(day(2024, 1, 14), PaymentMethod::CreditCard, None),
            day(2024, 1, 15)
        );
        assert_eq!(
            cycle.billing_date_for(day(2024, 1, 15), PaymentMethod::CreditCard, None),
            day(2024, 2, 15)
        );
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn detects_credit_card_keywords() {
        assert_eq!(
            detect_payment_method("Compra por $71.000 en LIDER", None),
            Some(PaymentMethod::CreditCard)
        );
        assert_eq!(
            detect_payment_method("pago con tarjeta de crédito", None),
            Some(PaymentMethod::CreditCard)
        );
    }

    #[test]
    fn detects_transfer_and_debit_keywords() {
        assert_eq!(
            detect_payment_method("Transferencia a Juan Pérez", None),
            Some(PaymentMethod::BankTransfer)
        );
        assert_eq!(
            detect_payment_method("Retiro en cajero automático", None),
            Some(PaymentMethod::DebitCard)
        );
    }

    #[test]
    fn credit_keywords_win_over_later_checks() {
        // "compra" (credit) and "debito" both present; credit is checked first.
        assert_eq!(
            detect_payment_method("compra con tarjeta debito", None),
            Some(PaymentMethod::CreditCard)
        );
    }

    #[test]
    fn indeterminate_text_with_card_hint_is_debit() {
        assert_eq!(
            detect_payment_method("movimiento en tu cuenta", Some("5646")),
            Some(PaymentMethod::DebitCard)
        );
    }

    #[test]
    fn indeterminate_text_is_none() {
        assert_eq!(detect_payment_method("movimiento en tu cuenta", None), None);
        assert_eq!(detect_payment_method("", None), None);
    }

    #[test]
    fn extracts_masked_card_digits() {
        assert_eq!(
            extract_card_last_four("tarjeta ****5646 por $71.000"),
            Some("5646".to_string())
        );
        assert_eq!(
            extract_card_last_four("tarjeta **** 5646"),
            Some("5646".to_string())
        );
        assert_eq!(
            extract_card_last_four("tarjeta ****-5646"),
            Some("5646".to_string())
        );
    }

    #[test]
    fn no_card_marker_yields_none() {
        assert_eq!(extract_card_last_four("sin tarjeta"), None);
        assert_eq!(extract_card_last_four("**12"), None);
    }

    #[test]
    fn summary_of_empty_list_is_zero() {
        let cycle = BillingCycle::default();
        let summary = cycle.billing_summary(&[], &DateRange::unbounded(), Utc::now());
        assert_eq!(summary, BillingSummary::default());
        assert_eq!(summary.total.count, 0);
        assert!(summary.pending_billing.is_zero());
    }

    #[test]
    fn summary_buckets_by_payment_method() {
        let cycle = BillingCycle::default();
        let expenses = vec![
            expense(1000, PaymentMethod::CreditCard, day(2024, 1, 10), day(2024, 1, 25)),
            expense(2000, PaymentMethod::CreditCard, day(2024, 1, 12), day(2024, 1, 25)),
            expense(500, PaymentMethod::DebitCard, day(2024, 1, 5), day(2024, 1, 5)),
            expense(300, PaymentMethod::Cash, day(2024, 1, 6), day(2024, 1, 6)),
        ];
        let now = day(2024, 2, 1).with_timezone(&Utc);

        let summary = cycle.billing_summary(&expenses, &DateRange::unbounded(), now);

        assert_eq!(summary.credit_card.count, 2);
        assert_eq!(summary.credit_card.amount.to_cents(), 3000);
        assert_eq!(summary.debit_card.count, 1);
        assert_eq!(summary.cash.count, 1);
        assert_eq!(summary.bank_transfer.count, 0);
        assert_eq!(summary.total.count, 4);
        assert_eq!(summary.total.amount.to_cents(), 3800);
        // Both credit charges billed before Feb 1.
        assert!(summary.pending_billing.is_zero());
    }

    #[test]
    fn pending_billing_counts_future_credit_charges_only() {
        let cycle = BillingCycle::default();
        let expenses = vec![
            // Billed in the future relative to "now".
            expense(1000, PaymentMethod::CreditCard, day(2024, 1, 26), day(2024, 2, 25)),
            // Already billed.
            expense(2000, PaymentMethod::CreditCard, day(2024, 1, 10), day(2024, 1, 25)),
            // Future-dated debit never pends.
            expense(500, PaymentMethod::DebitCard, day(2024, 2, 20), day(2024, 2, 20)),
        ];
        let now = day(2024, 2, 1).with_timezone(&Utc);

        let summary = cycle.billing_summary(&expenses, &DateRange::unbounded(), now);
        assert_eq!(summary.pending_billing.to_cents(), 1000);
    }

    #[test]
    fn billing_exactly_at_now_is_not_pending() {
        let cycle = BillingCycle::default();
        let billed = day(2024, 1, 25);
        let expenses = vec![expense(1000, PaymentMethod::CreditCard, day(2024, 1, 10), billed)];

        let summary =
            cycle.billing_summary(&expenses, &DateRange::unbounded(), billed.with_timezone(&Utc));
        assert!(summary.pending_billing.is_zero());
    }

    #[test]
    fn summary_range_filters_on_transaction_date() {
        let cycle = BillingCycle::default();
        let expenses = vec![
            expense(1000, PaymentMethod::Cash, day(2024, 1, 10), day(2024, 1, 10)),
            expense(2000, PaymentMethod::Cash, day(2024, 3, 10), day(2024, 3, 10)),
        ];
        let range = DateRange::new(
            day(2024, 1, 1).with_timezone(&Utc),
            day(2024, 1, 31).with_timezone(&Utc),
        );

        let summary = cycle.billing_summary(&expenses, &range, Utc::now());
        assert_eq!(summary.total.count, 1);
        assert_eq!(summary.total.amount.to_cents(), 1000);
    }
}
