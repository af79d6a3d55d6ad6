use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use gasto_core::{CategoryId, DateRange, Expense, Money};

/// Spending rollup over a set of expenses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total_amount: Money,
    pub transaction_count: u64,
    pub average_amount: Money,
    /// Per-category totals; uncategorized expenses count toward the overall
    /// figures but appear in no category.
    pub by_category: BTreeMap<CategoryId, Money>,
}

/// Aggregate expenses within an inclusive transaction-date range. An empty
/// selection produces the zero summary; the average never divides by zero.
pub fn expense_summary(expenses: &[Expense], range: &DateRange) -> ExpenseSummary {
    let mut summary = ExpenseSummary::default();

    for expense in expenses {
        if !range.contains(&expense.transaction_date) {
            continue;
        }

        summary.transaction_count += 1;
        summary.total_amount += expense.amount;

        if let Some(category_id) = expense.category_id {
            *summary
                .by_category
                .entry(category_id)
                .or_insert_with(Money::zero) += expense.amount;
        }
    }

    summary.average_amount = summary.total_amount.divided_by(summary.transaction_count);
    summary
}
