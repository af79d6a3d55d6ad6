pub mod category;
pub mod expense;
pub mod money;
pub mod period;

pub use category::{Category, CategoryId, DEFAULT_CATEGORIES};
pub use expense::{Expense, ExpenseUpdate, PaymentMethod};
pub use money::Money;
pub use period::DateRange;
