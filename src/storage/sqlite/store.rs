// File: src/storage/sqlite/store.rs

use super::config::SqliteConfig;
use super::schema;
use crate::error::StorageError;
use crate::traits::{LogStore, LoggedEntry, WriteResult};
use crate::tree_head::SignedTreeHead;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite implementation of the local log store
///
/// Holds [`LoggedEntry`] rows keyed by sequence number, plus every tree head
/// the driver chose to persist.
pub struct SqliteLogStore {
    /// Database connection (protected by mutex for thread safety)
    conn: Arc<Mutex<Connection>>,

    config: SqliteConfig,
}

impl SqliteLogStore {
    /// Open or create the database at `path` with default settings
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let config = SqliteConfig {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Open or create with custom configuration
    pub fn with_config(config: SqliteConfig) -> Result<Self, StorageError> {
        let conn = Connection::open(&config.path).map_err(|e| {
            StorageError::ConnectionFailed(format!("failed to open {}: {}", config.path, e))
        })?;

        Self::configure_connection(&conn, &config)?;
        schema::create_tables(&conn)?;

        tracing::debug!(path = %config.path, "Opened SQLite log store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_config(SqliteConfig {
            path: ":memory:".to_string(),
            wal_mode: false,
            ..Default::default()
        })
    }

    /// Database path this store was opened with
    pub fn path(&self) -> &str {
        &self.config.path
    }

    fn configure_connection(conn: &Connection, config: &SqliteConfig) -> Result<(), StorageError> {
        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        conn.pragma_update(None, "busy_timeout", config.busy_timeout_ms)?;
        // Entries must survive power loss once committed.
        conn.pragma_update(None, "synchronous", "FULL")?;
        Ok(())
    }

    /// Get locked connection for internal operations
    pub(super) fn get_conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl LogStore<LoggedEntry> for SqliteLogStore {
    fn lookup_by_index(&self, index: u64) -> Result<Option<LoggedEntry>, StorageError> {
        self.lookup_by_index_impl(index)
    }

    fn create_sequenced_entry(&self, entry: &LoggedEntry) -> Result<WriteResult, StorageError> {
        self.create_sequenced_entry_impl(entry)
    }

    fn latest_tree_head(&self) -> Result<Option<SignedTreeHead>, StorageError> {
        self.latest_tree_head_impl()
    }

    fn store_tree_head(&self, sth: &SignedTreeHead) -> Result<(), StorageError> {
        self.store_tree_head_impl(sth)
    }

    fn current_committed_size(&self) -> Result<u64, StorageError> {
        self.current_committed_size_impl()
    }
}
