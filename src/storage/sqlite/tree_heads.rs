// File: src/storage/sqlite/tree_heads.rs

use super::convert::row_to_tree_head;
use super::store::SqliteLogStore;
use crate::error::StorageError;
use crate::tree_head::SignedTreeHead;
use rusqlite::{params, OptionalExtension};

impl SqliteLogStore {
    /// Record a signed tree head; re-storing the same head is a no-op
    pub(super) fn store_tree_head_impl(&self, sth: &SignedTreeHead) -> Result<(), StorageError> {
        let conn = self.get_conn()?;
        let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);

        conn.execute(
            "INSERT OR IGNORE INTO tree_heads (tree_size, timestamp, version, root_hash, signature, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sth.tree_size as i64,
                sth.timestamp as i64,
                sth.version.as_u8(),
                sth.root_hash.as_slice(),
                sth.signature,
                now,
            ],
        )?;

        Ok(())
    }

    /// Largest head by (tree_size, timestamp)
    pub(super) fn latest_tree_head_impl(&self) -> Result<Option<SignedTreeHead>, StorageError> {
        let conn = self.get_conn()?;

        let sth = conn
            .query_row(
                "SELECT tree_size, timestamp, version, root_hash, signature
                 FROM tree_heads ORDER BY tree_size DESC, timestamp DESC LIMIT 1",
                [],
                row_to_tree_head,
            )
            .optional()?;

        Ok(sth)
    }
}
