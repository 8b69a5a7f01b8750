//! In-memory log store

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::error::StorageError;
use crate::traits::{EntryHash, LogStore, Loggable, WriteResult};
use crate::tree_head::SignedTreeHead;

struct Inner<E> {
    entries: BTreeMap<u64, E>,
    by_hash: HashMap<EntryHash, u64>,
    tree_heads: Vec<SignedTreeHead>,
}

/// Log store kept entirely in process memory
pub struct MemoryLogStore<E> {
    inner: Mutex<Inner<E>>,
}

impl<E: Loggable> MemoryLogStore<E> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: BTreeMap::new(),
                by_hash: HashMap::new(),
                tree_heads: Vec::new(),
            }),
        }
    }

    /// Number of stored tree heads
    pub fn tree_head_count(&self) -> usize {
        self.lock().map(|inner| inner.tree_heads.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<E>>, StorageError> {
        self.inner.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl<E: Loggable> Default for MemoryLogStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Loggable> LogStore<E> for MemoryLogStore<E> {
    fn lookup_by_index(&self, index: u64) -> Result<Option<E>, StorageError> {
        Ok(self.lock()?.entries.get(&index).cloned())
    }

    fn create_sequenced_entry(&self, entry: &E) -> Result<WriteResult, StorageError> {
        let sequence_number = entry
            .sequence_number()
            .ok_or(StorageError::MissingSequenceNumber)?;
        let hash = entry.entry_hash();

        let mut inner = self.lock()?;
        if inner.entries.contains_key(&sequence_number) {
            return Ok(WriteResult::SequenceNumberAlreadyInUse);
        }
        if inner.by_hash.contains_key(&hash) {
            return Ok(WriteResult::EntryAlreadyLogged);
        }
        inner.entries.insert(sequence_number, entry.clone());
        inner.by_hash.insert(hash, sequence_number);
        Ok(WriteResult::Ok)
    }

    fn latest_tree_head(&self) -> Result<Option<SignedTreeHead>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .tree_heads
            .iter()
            .max_by_key(|sth| (sth.tree_size, sth.timestamp))
            .cloned())
    }

    fn store_tree_head(&self, sth: &SignedTreeHead) -> Result<(), StorageError> {
        self.lock()?.tree_heads.push(sth.clone());
        Ok(())
    }

    fn current_committed_size(&self) -> Result<u64, StorageError> {
        Ok(self
            .lock()?
            .entries
            .keys()
            .next_back()
            .map_or(0, |last| last + 1))
    }
}
