use chrono::NaiveDate;

use super::error::{Error, Field, FieldProblem, Result, ValidationError};
use super::store::parse_amount;
use crate::db::{DocKey, DocumentStore};
use crate::models::{Category, Transaction, TransactionDraft, MAX_AMOUNT};

/// Append-only record of transactions in entry order.
#[derive(Debug, Default, Clone)]
pub(crate) struct Ledger {
    entries: Vec<Transaction>,
}

impl Ledger {
    /// Reads the persisted ledger; empty when nothing was saved yet.
    pub(crate) fn load(store: &impl DocumentStore) -> Result<Self> {
        let entries = match store.read(DocKey::Transactions)? {
            Some(doc) => serde_json::from_str::<Vec<Transaction>>(&doc)?,
            None => Vec::new(),
        };
        if let Some(bad) = entries
            .iter()
            .find(|t| t.amount.is_sign_negative() || t.amount > MAX_AMOUNT)
        {
            return Err(Error::PersistenceUnavailable(format!(
                "corrupt document: transaction '{}' has out-of-range amount {}",
                bad.name, bad.amount
            )));
        }
        tracing::debug!("Loaded {} transactions", entries.len());
        Ok(Self { entries })
    }

    /// Validates `draft`, persists the ledger with it appended, and only then
    /// appends it in memory.
    pub(crate) fn append(
        &mut self,
        store: &mut impl DocumentStore,
        draft: &TransactionDraft,
    ) -> Result<Transaction> {
        let txn = match validate_transaction(draft) {
            Ok(t) => t,
            Err(e) => {
                tracing::info!("Rejected transaction: {e}");
                return Err(e.into());
            }
        };

        let next: Vec<&Transaction> = self.entries.iter().chain(std::iter::once(&txn)).collect();
        let doc = serde_json::to_string(&next)?;
        if let Err(e) = store.write_all(&[(DocKey::Transactions, doc)]) {
            tracing::warn!("Failed to persist ledger: {e}");
            return Err(e.into());
        }

        tracing::debug!(
            "Appended {} {} to {}, ledger now has {} entries",
            txn.amount,
            txn.name,
            txn.category,
            self.entries.len() + 1
        );
        self.entries.push(txn.clone());
        Ok(txn)
    }

    pub(crate) fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries dated in `month` (`YYYY-MM`), in entry order.
    pub(crate) fn in_month<'a>(&'a self, month: &str) -> impl Iterator<Item = &'a Transaction> + 'a {
        let month = month.to_owned();
        self.entries.iter().filter(move |t| t.month() == month)
    }
}

/// Turns raw input into a [`Transaction`], collecting every invalid field.
pub(crate) fn validate_transaction(
    draft: &TransactionDraft,
) -> std::result::Result<Transaction, ValidationError> {
    let mut problems = Vec::new();

    let date = draft.date.trim();
    let date = if date.is_empty() {
        problems.push(FieldProblem::Missing(Field::Date));
        None
    } else {
        match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                problems.push(FieldProblem::InvalidDate(date.to_string()));
                None
            }
        }
    };

    let amount = match parse_amount(&draft.amount, Field::Amount) {
        Ok(a) => Some(a),
        Err(p) => {
            problems.push(p);
            None
        }
    };

    let name = draft.name.trim();
    if name.is_empty() {
        problems.push(FieldProblem::Missing(Field::Name));
    }

    let category = draft.category.trim();
    let category = if category.is_empty() {
        problems.push(FieldProblem::Missing(Field::Category));
        None
    } else {
        let parsed = Category::parse(category);
        if parsed.is_none() {
            problems.push(FieldProblem::UnknownCategory(category.to_string()));
        }
        parsed
    };

    match (date, amount, category) {
        (Some(date), Some(amount), Some(category)) if problems.is_empty() => Ok(Transaction {
            date,
            amount,
            name: name.to_string(),
            category,
        }),
        _ => Err(ValidationError { problems }),
    }
}
