use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Category;

/// A recorded expense. Never mutated once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Transaction {
    pub(crate) date: NaiveDate,
    pub(crate) amount: Decimal,
    pub(crate) name: String,
    pub(crate) category: Category,
}

impl Transaction {
    /// Month key (`YYYY-MM`) of the transaction date.
    pub(crate) fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// Raw user input for a transaction, as typed into the form or passed on the
/// command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TransactionDraft {
    pub(crate) date: String,
    pub(crate) amount: String,
    pub(crate) name: String,
    pub(crate) category: String,
}

impl TransactionDraft {
    pub(crate) fn new(
        date: impl Into<String>,
        amount: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            amount: amount.into(),
            name: name.into(),
            category: category.into(),
        }
    }
}
