//! StatusStore: redb-backed persistence of the last confirmed status.
//!
//! Every `set` is its own committed write transaction, so a crash mid-run
//! loses at most the transitions that had not been written yet; those are
//! re-detected on the next run. The store supports both on-disk and
//! in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, DatabaseError, ReadOnlyDatabase, ReadableDatabase, ReadableTable, TableError};
use statusmon_core::Status;
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};
use crate::tables::STATUSES;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// One row of the store as reported by [`StatusStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub service: String,
    /// `None` when the stored bytes are not a recognised status.
    pub status: Option<Status>,
}

/// Thread-safe status store backed by redb.
#[derive(Clone)]
pub struct StatusStore {
    db: Arc<Database>,
}

impl StatusStore {
    /// Open (or create) a persistent status store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "status store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory status store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory status store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(STATUSES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Last confirmed status of a service.
    ///
    /// Returns `None` both for a service that was never observed and for an
    /// entry whose bytes do not decode; the latter is logged.
    pub fn get(&self, service: &str) -> StateResult<Option<Status>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(STATUSES).map_err(map_err!(Table))?;
        let Some(guard) = table.get(service).map_err(map_err!(Read))? else {
            return Ok(None);
        };
        let raw = guard.value();
        match Status::from_bytes(raw) {
            Some(status) => Ok(Some(status)),
            None => {
                warn!(
                    %service,
                    value = %String::from_utf8_lossy(raw),
                    "stored status is not decodable, treating as never observed"
                );
                Ok(None)
            }
        }
    }

    /// Persist the confirmed status of a service, replacing any previous
    /// value.
    pub fn set(&self, service: &str, status: Status) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(STATUSES).map_err(map_err!(Table))?;
            table
                .insert(service, status.as_str().as_bytes())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%service, %status, "status stored");
        Ok(())
    }

    /// Every stored entry, ordered by service name.
    pub fn list(&self) -> StateResult<Vec<StatusEntry>> {
        list_entries(self.db.as_ref())
    }
}

/// Read-only view of an existing status database.
///
/// Never creates the file or the table and never opens a write transaction.
/// redb takes a shared lock here, so opening fails with
/// [`StateError::Locked`] while a run holds the database.
pub struct StatusReader {
    db: ReadOnlyDatabase,
}

impl StatusReader {
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = ReadOnlyDatabase::open(path).map_err(|e| match e {
            DatabaseError::DatabaseAlreadyOpen => StateError::Locked(path.display().to_string()),
            other => StateError::Open(other.to_string()),
        })?;
        debug!(?path, "status store opened read-only");
        Ok(Self { db })
    }

    /// Every stored entry, ordered by service name. A database that never
    /// recorded a status lists nothing.
    pub fn list(&self) -> StateResult<Vec<StatusEntry>> {
        list_entries(&self.db)
    }
}

fn list_entries(db: &impl ReadableDatabase) -> StateResult<Vec<StatusEntry>> {
    let txn = db.begin_read().map_err(map_err!(Transaction))?;
    let table = match txn.open_table(STATUSES) {
        Ok(table) => table,
        Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
        Err(e) => return Err(StateError::Table(e.to_string())),
    };
    let mut results = Vec::new();
    for entry in table.iter().map_err(map_err!(Read))? {
        let (key, value) = entry.map_err(map_err!(Read))?;
        results.push(StatusEntry {
            service: key.value().to_string(),
            status: Status::from_bytes(value.value()),
        });
    }
    Ok(results)
}
