//! Pure derivations over the ledger and budgets. Nothing here reads the
//! clock or keeps state between calls.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::{Category, CategoryBudget, Transaction};

/// Number of entries the recent-transactions list shows by default.
pub(crate) const DEFAULT_RECENT_WINDOW: usize = 5;

/// Sum of amounts per category. Categories with no entries are absent.
pub(crate) fn spend_by_category(ledger: &[Transaction]) -> BTreeMap<Category, Decimal> {
    let mut spent = BTreeMap::new();
    for txn in ledger {
        *spent.entry(txn.category).or_insert(Decimal::ZERO) += txn.amount;
    }
    spent
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Totals {
    pub(crate) total_spent: Decimal,
    pub(crate) total_budget: Decimal,
}

/// `total_budget` counts every budgeted category whether or not anything was
/// spent in it, and is zero when budgets are unset.
pub(crate) fn totals(ledger: &[Transaction], budgets: Option<&CategoryBudget>) -> Totals {
    Totals {
        total_spent: ledger.iter().map(|t| t.amount).sum(),
        total_budget: budgets.map(CategoryBudget::total).unwrap_or(Decimal::ZERO),
    }
}

/// The newest `limit` entries of a ledger, newest first. Cheap to copy and
/// can be iterated any number of times.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecentWindow<'a> {
    entries: &'a [Transaction],
    limit: usize,
}

impl<'a> RecentWindow<'a> {
    pub(crate) fn iter(&self) -> std::iter::Take<std::iter::Rev<std::slice::Iter<'a, Transaction>>> {
        self.entries.iter().rev().take(self.limit)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len().min(self.limit)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for RecentWindow<'a> {
    type Item = &'a Transaction;
    type IntoIter = std::iter::Take<std::iter::Rev<std::slice::Iter<'a, Transaction>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Recency is entry order: the last appended transaction comes first.
pub(crate) fn recent_window(ledger: &[Transaction], n: usize) -> RecentWindow<'_> {
    RecentWindow {
        entries: ledger,
        limit: n,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategorySummary {
    pub(crate) category: Category,
    pub(crate) budget: Decimal,
    pub(crate) spent: Decimal,
    /// `budget - spent`; negative once over budget.
    pub(crate) remaining: Decimal,
    /// Fraction of all spending that went to this category, 0 to 1.
    pub(crate) share: Decimal,
}

impl CategorySummary {
    /// Spent as a fraction of budget; `None` when nothing was budgeted.
    pub(crate) fn used_ratio(&self) -> Option<Decimal> {
        if self.budget > Decimal::ZERO {
            Some(self.spent / self.budget)
        } else {
            None
        }
    }

    pub(crate) fn is_over(&self) -> bool {
        self.remaining < Decimal::ZERO
    }
}

/// Everything the dashboard shows, derived in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct AggregatedView {
    /// One row per category, in declaration order.
    pub(crate) categories: Vec<CategorySummary>,
    pub(crate) totals: Totals,
    pub(crate) monthly_income: Decimal,
    /// `monthly_income - total_spent`.
    pub(crate) balance: Decimal,
}

impl AggregatedView {
    pub(crate) fn compute(
        ledger: &[Transaction],
        budgets: Option<&CategoryBudget>,
        monthly_income: Decimal,
    ) -> Self {
        let spent = spend_by_category(ledger);
        let totals = totals(ledger, budgets);

        let categories = Category::all()
            .iter()
            .map(|&category| {
                let budget = budgets.map(|b| b.get(category)).unwrap_or(Decimal::ZERO);
                let spent = spent.get(&category).copied().unwrap_or(Decimal::ZERO);
                let share = if totals.total_spent > Decimal::ZERO {
                    spent / totals.total_spent
                } else {
                    Decimal::ZERO
                };
                CategorySummary {
                    category,
                    budget,
                    spent,
                    remaining: budget - spent,
                    share,
                }
            })
            .collect();

        Self {
            categories,
            totals,
            monthly_income,
            balance: monthly_income - totals.total_spent,
        }
    }

    pub(crate) fn summary(&self, category: Category) -> Option<&CategorySummary> {
        self.categories.iter().find(|s| s.category == category)
    }

    pub(crate) fn total_remaining(&self) -> Decimal {
        self.totals.total_budget - self.totals.total_spent
    }
}
