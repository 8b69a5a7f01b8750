// File: src/storage/sqlite/convert.rs

use crate::traits::LoggedEntry;
use crate::tree_head::{SignedTreeHead, TreeHeadVersion};
use rusqlite::types::Type;
use rusqlite::Row;

/// Convert a `(sequence_number, timestamp, payload)` row to LoggedEntry
pub fn row_to_entry(row: &Row) -> rusqlite::Result<LoggedEntry> {
    let sequence_number: i64 = row.get(0)?;
    let timestamp: i64 = row.get(1)?;
    let payload: Vec<u8> = row.get(2)?;

    Ok(LoggedEntry {
        payload,
        timestamp: timestamp as u64,
        sequence_number: Some(sequence_number as u64),
    })
}

/// Convert a `(tree_size, timestamp, version, root_hash, signature)` row
pub fn row_to_tree_head(row: &Row) -> rusqlite::Result<SignedTreeHead> {
    let tree_size: i64 = row.get(0)?;
    let timestamp: i64 = row.get(1)?;
    let version: u8 = row.get(2)?;
    let root_hash: Vec<u8> = row.get(3)?;
    let signature: Vec<u8> = row.get(4)?;

    Ok(SignedTreeHead {
        version: TreeHeadVersion::from_u8(version)
            .ok_or_else(|| rusqlite::Error::InvalidColumnType(2, "version".into(), Type::Integer))?,
        timestamp: timestamp as u64,
        tree_size: tree_size as u64,
        root_hash: root_hash
            .try_into()
            .map_err(|_| rusqlite::Error::InvalidColumnType(3, "root_hash".into(), Type::Blob))?,
        signature,
    })
}
