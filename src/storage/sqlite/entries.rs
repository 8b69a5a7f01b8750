// File: src/storage/sqlite/entries.rs

use super::convert::row_to_entry;
use super::store::SqliteLogStore;
use crate::error::StorageError;
use crate::traits::{Loggable, LoggedEntry, WriteResult};
use rusqlite::{params, OptionalExtension};

impl SqliteLogStore {
    pub(super) fn lookup_by_index_impl(
        &self,
        index: u64,
    ) -> Result<Option<LoggedEntry>, StorageError> {
        let conn = self.get_conn()?;
        let entry = conn
            .query_row(
                "SELECT sequence_number, timestamp, payload FROM entries WHERE sequence_number = ?1",
                params![index as i64],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    /// Insert an entry unless its index or hash is already taken
    pub(super) fn create_sequenced_entry_impl(
        &self,
        entry: &LoggedEntry,
    ) -> Result<WriteResult, StorageError> {
        let sequence_number = entry
            .sequence_number()
            .ok_or(StorageError::MissingSequenceNumber)?;
        let entry_hash = entry.entry_hash();

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let index_taken = tx
            .query_row(
                "SELECT 1 FROM entries WHERE sequence_number = ?1",
                params![sequence_number as i64],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if index_taken {
            return Ok(WriteResult::SequenceNumberAlreadyInUse);
        }

        let hash_taken = tx
            .query_row(
                "SELECT 1 FROM entries WHERE entry_hash = ?1",
                params![entry_hash.as_slice()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if hash_taken {
            return Ok(WriteResult::EntryAlreadyLogged);
        }

        let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
        tx.execute(
            "INSERT INTO entries (sequence_number, entry_hash, timestamp, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                sequence_number as i64,
                entry_hash.as_slice(),
                entry.timestamp as i64,
                entry.payload,
                now,
            ],
        )?;
        tx.commit()?;

        Ok(WriteResult::Ok)
    }

    pub(super) fn current_committed_size_impl(&self) -> Result<u64, StorageError> {
        let conn = self.get_conn()?;
        let size: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_number), -1) + 1 FROM entries",
            [],
            |row| row.get(0),
        )?;
        Ok(size as u64)
    }
}
