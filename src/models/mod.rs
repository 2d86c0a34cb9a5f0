mod budget;
mod category;
mod transaction;

pub(crate) use budget::{BudgetDraft, CategoryBudget, MAX_AMOUNT};
pub(crate) use category::Category;
pub(crate) use transaction::{Transaction, TransactionDraft};
