//! redb-based persistence for registration sessions and the processing report
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `sessions` | `session_id` | `RegistrationState` (JSON) | Operator state across reloads |
//! | `report_entries` | `numero` | `ReportEntry` (JSON) | Processed products, in order |
//!
//! A stored session that no longer deserializes (older schema) is treated
//! as absent and overwritten on the next save.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use shared::models::{ReportEntry, ReportStatus};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::registration::RegistrationState;

/// key = session id, value = JSON-serialized RegistrationState
const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// key = report number, value = JSON-serialized ReportEntry
const REPORT_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("report_entries");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::AppError {
    fn from(err: StorageError) -> Self {
        shared::AppError::database(err.to_string())
    }
}

/// Session and report storage backed by redb
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl Storage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSIONS_TABLE)?;
            let _ = write_txn.open_table(REPORT_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    // ========== Sessions ==========

    /// Stored state of a session, `None` when absent or unreadable
    pub fn load_session(&self, session_id: &str) -> StorageResult<Option<RegistrationState>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;
        let Some(raw) = table.get(session_id)? else {
            return Ok(None);
        };
        match serde_json::from_slice::<RegistrationState>(raw.value()) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "Discarding unreadable session state");
                Ok(None)
            }
        }
    }

    pub fn save_session(&self, session_id: &str, state: &RegistrationState) -> StorageResult<()> {
        let bytes = serde_json::to_vec(state)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS_TABLE)?;
            table.insert(session_id, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // ========== Report ==========

    /// Append a report entry; `numero` is the highest existing number + 1
    pub fn append_report(
        &self,
        titulo: &str,
        url: &str,
        fecha: &str,
        estado: ReportStatus,
    ) -> StorageResult<ReportEntry> {
        let write_txn = self.db.begin_write()?;
        let entry = {
            let mut table = write_txn.open_table(REPORT_TABLE)?;
            let numero = table.last()?.map(|(k, _)| k.value()).unwrap_or(0) + 1;
            let entry = ReportEntry {
                numero,
                titulo: titulo.to_string(),
                url: url.to_string(),
                fecha: fecha.to_string(),
                estado,
            };
            let bytes = serde_json::to_vec(&entry)?;
            table.insert(numero, bytes.as_slice())?;
            entry
        };
        write_txn.commit()?;
        Ok(entry)
    }

    /// All report entries ordered by number
    pub fn report_entries(&self) -> StorageResult<Vec<ReportEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REPORT_TABLE)?;
        let mut entries = Vec::with_capacity(table.len()? as usize);
        for item in table.iter()? {
            let (_, value) = item?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok(entries)
    }

    /// Remove every report entry, returning how many were removed
    pub fn clear_report(&self) -> StorageResult<u64> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let table = write_txn.open_table(REPORT_TABLE)?;
            table.len()?
        };
        write_txn.delete_table(REPORT_TABLE)?;
        {
            let _ = write_txn.open_table(REPORT_TABLE)?;
        }
        write_txn.commit()?;
        Ok(removed)
    }
}
