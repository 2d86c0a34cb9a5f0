use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Category;

/// Largest amount accepted for a single budget or transaction
/// (1,000,000,000,000). Keeps every sum well inside `Decimal` range.
pub(crate) const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Allocated amount per category. Every key is a known [`Category`] and every
/// amount is non-negative; the budget store only builds one from validated
/// input.
///
/// Persisted as a JSON object keyed by category display name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, Decimal>",
    try_from = "BTreeMap<String, Decimal>"
)]
pub(crate) struct CategoryBudget {
    amounts: BTreeMap<Category, Decimal>,
}

impl CategoryBudget {
    pub(crate) fn get(&self, category: Category) -> Decimal {
        self.amounts.get(&category).copied().unwrap_or(Decimal::ZERO)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Category, Decimal)> + '_ {
        self.amounts.iter().map(|(c, a)| (*c, *a))
    }

    pub(crate) fn total(&self) -> Decimal {
        self.amounts.values().copied().sum()
    }

    pub(crate) fn len(&self) -> usize {
        self.amounts.len()
    }

    /// Builds a budget from already-validated amounts. Callers outside the
    /// budget store go through `BudgetDraft` validation instead.
    pub(crate) fn from_validated(amounts: BTreeMap<Category, Decimal>) -> Self {
        Self { amounts }
    }
}

impl From<CategoryBudget> for BTreeMap<String, Decimal> {
    fn from(budget: CategoryBudget) -> Self {
        budget
            .amounts
            .into_iter()
            .map(|(c, a)| (c.as_str().to_string(), a))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, Decimal>> for CategoryBudget {
    type Error = String;

    fn try_from(raw: BTreeMap<String, Decimal>) -> Result<Self, Self::Error> {
        let mut amounts = BTreeMap::new();
        for (name, amount) in raw {
            let category =
                Category::parse(&name).ok_or_else(|| format!("unknown category '{name}'"))?;
            if amount < Decimal::ZERO {
                return Err(format!("negative budget for {category}: {amount}"));
            }
            if amount > MAX_AMOUNT {
                return Err(format!("budget for {category} is out of range: {amount}"));
            }
            amounts.insert(category, amount);
        }
        Ok(Self { amounts })
    }
}

/// Raw setup-form input: one `(category name, amount text)` pair per input.
#[derive(Debug, Clone, Default)]
pub(crate) struct BudgetDraft {
    pub(crate) entries: Vec<(String, String)>,
}

impl BudgetDraft {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, category: impl Into<String>, amount: impl Into<String>) -> Self {
        self.entries.push((category.into(), amount.into()));
        self
    }

    /// Parses `Category=amount` tokens, as typed on the command line.
    /// Tokens without `=` become entries with an empty amount so validation
    /// reports them.
    pub(crate) fn from_assignments<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let entries = tokens
            .into_iter()
            .map(|token| match token.split_once('=') {
                Some((name, amount)) => (name.trim().to_string(), amount.trim().to_string()),
                None => (token.trim().to_string(), String::new()),
            })
            .collect();
        Self { entries }
    }
}
