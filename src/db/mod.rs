mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Names of the documents the app persists. Each is stored whole and replaced
/// whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum DocKey {
    Budgets,
    Transactions,
    SetupComplete,
}

impl DocKey {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Budgets => "categoryBudgets",
            Self::Transactions => "transactions",
            Self::SetupComplete => "initialSetupComplete",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Synchronous key-value document storage. Writes are all-or-nothing: either
/// every document in a `write_all` call lands or none does.
pub(crate) trait DocumentStore {
    fn read(&self, key: DocKey) -> std::result::Result<Option<String>, StoreError>;

    fn write_all(&mut self, docs: &[(DocKey, String)]) -> std::result::Result<(), StoreError>;

    /// Removes every document.
    fn clear(&mut self) -> std::result::Result<(), StoreError>;
}

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        tracing::debug!(
            "Opened database at {} (schema v{})",
            path.display(),
            db.schema_version()?
        );
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        // Check if schema_version table exists
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    pub(crate) fn schema_version(&self) -> Result<i32> {
        Ok(self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })?)
    }

    /// When the document was last written (RFC 3339), if it exists.
    pub(crate) fn updated_at(&self, key: DocKey) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT updated_at FROM documents WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl DocumentStore for Database {
    fn read(&self, key: DocKey) -> std::result::Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM documents WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn write_all(&mut self, docs: &[(DocKey, String)]) -> std::result::Result<(), StoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        for (key, value) in docs {
            tx.execute(
                "INSERT INTO documents (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key.as_str(), value, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn clear(&mut self) -> std::result::Result<(), StoreError> {
        self.conn.execute("DELETE FROM documents", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
