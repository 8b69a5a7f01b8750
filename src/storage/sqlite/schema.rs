// File: src/storage/sqlite/schema.rs

use crate::error::StorageError;
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Create all tables (idempotent)
pub fn create_tables(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Sequenced entries, one row per leaf
CREATE TABLE IF NOT EXISTS entries (
    sequence_number INTEGER PRIMARY KEY,    -- Leaf index
    entry_hash BLOB NOT NULL UNIQUE,        -- 32 bytes, entry identity
    timestamp INTEGER NOT NULL,             -- Submission time, Unix ms
    payload BLOB NOT NULL,                  -- Opaque entry bytes
    created_at INTEGER NOT NULL             -- Commit time, Unix nanoseconds
);

-- Signed tree heads recorded by the driver
CREATE TABLE IF NOT EXISTS tree_heads (
    tree_size INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,             -- Unix ms
    version INTEGER NOT NULL,
    root_hash BLOB NOT NULL,                -- 32 bytes
    signature BLOB NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (tree_size, timestamp)
);
"#;
