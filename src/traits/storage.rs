//! Local log store interface

use crate::error::StorageError;
use crate::traits::entry::Loggable;
use crate::tree_head::SignedTreeHead;

/// Outcome of committing a sequenced entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// Entry stored at its sequence number
    Ok,

    /// Another entry already owns that sequence number
    SequenceNumberAlreadyInUse,

    /// The same entry hash is already stored at another index
    EntryAlreadyLogged,
}

/// Durable, node-local mapping from sequence number to committed entry
///
/// Calls block. Implementations must never overwrite a committed index.
pub trait LogStore<E: Loggable>: Send + Sync {
    /// Entry committed at `index`, `None` if absent
    ///
    /// # Errors
    /// * `StorageError` - backend read failure
    fn lookup_by_index(&self, index: u64) -> Result<Option<E>, StorageError>;

    /// Commit an entry at its own sequence number
    ///
    /// # Errors
    /// * `StorageError::MissingSequenceNumber` - entry was never sequenced
    /// * `StorageError` - backend write failure
    fn create_sequenced_entry(&self, entry: &E) -> Result<WriteResult, StorageError>;

    /// Most recently stored signed tree head, `None` for a fresh log
    fn latest_tree_head(&self) -> Result<Option<SignedTreeHead>, StorageError>;

    /// Durably record a signed tree head
    ///
    /// Called by whoever drives the signer; the engine itself never persists
    /// heads.
    fn store_tree_head(&self, sth: &SignedTreeHead) -> Result<(), StorageError>;

    /// Number of committed entries (one past the highest index)
    fn current_committed_size(&self) -> Result<u64, StorageError>;
}
