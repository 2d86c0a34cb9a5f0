use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::mpsc::{channel, Receiver, Sender};

use super::error::{Field, FieldProblem, Result, ValidationError};
use crate::db::{DocKey, DocumentStore};
use crate::models::{BudgetDraft, Category, CategoryBudget, MAX_AMOUNT};

/// Notification sent to budget subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BudgetEvent {
    Saved(CategoryBudget),
}

/// Owns the per-category budgets. `None` until first-run setup completes.
#[derive(Debug, Default)]
pub(crate) struct BudgetStore {
    budgets: Option<CategoryBudget>,
    subscribers: Vec<Sender<BudgetEvent>>,
}

impl BudgetStore {
    /// Reads the persisted budgets. An absent document leaves the store
    /// unset, which tells the caller to run setup.
    pub(crate) fn load(store: &impl DocumentStore) -> Result<Self> {
        let budgets = match store.read(DocKey::Budgets)? {
            Some(doc) => Some(serde_json::from_str::<CategoryBudget>(&doc)?),
            None => None,
        };
        match &budgets {
            Some(b) => tracing::debug!("Loaded budgets for {} categories", b.len()),
            None => tracing::debug!("No saved budgets, setup required"),
        }
        Ok(Self {
            budgets,
            subscribers: Vec::new(),
        })
    }

    pub(crate) fn budgets(&self) -> Option<&CategoryBudget> {
        self.budgets.as_ref()
    }

    pub(crate) fn is_set(&self) -> bool {
        self.budgets.is_some()
    }

    /// Registers a subscriber. Dropping the receiver unsubscribes.
    pub(crate) fn subscribe(&mut self) -> Receiver<BudgetEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Validates and persists a full replacement of the budgets, then
    /// notifies subscribers. On any error nothing is persisted, memory is
    /// untouched and no event is sent.
    pub(crate) fn save(
        &mut self,
        store: &mut impl DocumentStore,
        draft: &BudgetDraft,
    ) -> Result<CategoryBudget> {
        let budgets = match validate_budgets(draft) {
            Ok(b) => b,
            Err(e) => {
                tracing::info!("Rejected budget setup: {e}");
                return Err(e.into());
            }
        };

        let doc = serde_json::to_string(&budgets)?;
        let flag = serde_json::to_string(&true)?;
        if let Err(e) = store.write_all(&[(DocKey::Budgets, doc), (DocKey::SetupComplete, flag)]) {
            tracing::warn!("Failed to persist budgets: {e}");
            return Err(e.into());
        }

        tracing::debug!("Saved budgets, total {}", budgets.total());
        self.budgets = Some(budgets.clone());
        self.broadcast(BudgetEvent::Saved(budgets.clone()));
        Ok(budgets)
    }

    fn broadcast(&mut self, event: BudgetEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Checks that every category appears exactly once with a non-negative
/// numeric amount.
pub(crate) fn validate_budgets(
    draft: &BudgetDraft,
) -> std::result::Result<CategoryBudget, ValidationError> {
    let mut problems = Vec::new();
    let mut amounts: BTreeMap<Category, Decimal> = BTreeMap::new();
    let mut seen: Vec<Category> = Vec::new();

    for (name, raw) in &draft.entries {
        let Some(category) = Category::parse(name) else {
            problems.push(FieldProblem::UnknownCategory(name.clone()));
            continue;
        };
        let field = Field::Budget(category);
        if seen.contains(&category) {
            problems.push(FieldProblem::Duplicate(field));
            continue;
        }
        seen.push(category);

        match parse_amount(raw, field) {
            Ok(amount) => {
                amounts.insert(category, amount);
            }
            Err(p) => problems.push(p),
        }
    }

    for category in Category::all() {
        if !seen.contains(category) {
            problems.push(FieldProblem::Missing(Field::Budget(*category)));
        }
    }

    ValidationError::check(problems)?;
    Ok(CategoryBudget::from_validated(amounts))
}

/// Parses a non-negative decimal no larger than [`MAX_AMOUNT`]. A leading `$`
/// and thousands commas are tolerated.
pub(crate) fn parse_amount(raw: &str, field: Field) -> std::result::Result<Decimal, FieldProblem> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).replace(',', "");
    if trimmed.is_empty() {
        return Err(FieldProblem::Missing(field));
    }
    let amount = Decimal::from_str(&trimmed).map_err(|_| FieldProblem::NotANumber {
        field,
        value: raw.trim().to_string(),
    })?;
    if amount < Decimal::ZERO {
        return Err(FieldProblem::Negative(field));
    }
    if amount > MAX_AMOUNT {
        return Err(FieldProblem::TooLarge(field));
    }
    Ok(amount)
}
