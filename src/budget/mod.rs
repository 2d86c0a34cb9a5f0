//! Budget store, transaction ledger and the aggregation over both.

mod aggregate;
mod error;
mod ledger;
mod store;

pub(crate) use aggregate::{recent_window, AggregatedView, RecentWindow, DEFAULT_RECENT_WINDOW};
pub(crate) use error::{Error, Field, FieldProblem, Result};
pub(crate) use ledger::Ledger;
pub(crate) use store::{parse_amount, BudgetEvent, BudgetStore};

use crate::db::DocumentStore;

/// Deletes every persisted document. Callers reload their stores afterwards.
pub(crate) fn reset_all(store: &mut impl DocumentStore) -> Result<()> {
    store.clear().map_err(|e| {
        tracing::warn!("Failed to clear storage: {e}");
        Error::from(e)
    })?;
    tracing::info!("Cleared all saved budgets and transactions");
    Ok(())
}

#[cfg(test)]
mod tests;
