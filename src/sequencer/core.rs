//! TreeSigner state and the single-entry append path

use std::sync::Arc;

use tracing::{debug, error};

use crate::clock::Clock;
use crate::error::{SignerError, SignerResult};
use crate::merkle::{CompactMerkleTree, Hash};
use crate::traits::{ConsistentStore, LogStore, Loggable, TreeHeadSigner, WriteResult};
use crate::tree_head::SignedTreeHead;

use super::config::SequencerConfig;

/// Result of [`TreeSigner::append`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Entry committed and added to the tree
    Appended,

    /// Another actor already owns the sequence number
    DuplicateSequenceNumber,

    /// The entry is already committed at another index
    AlreadyLogged,
}

impl AppendOutcome {
    pub fn is_appended(self) -> bool {
        self == AppendOutcome::Appended
    }
}

/// Sequencing and signing engine for one node
pub struct TreeSigner<E: Loggable> {
    pub(super) config: SequencerConfig,
    pub(super) log_store: Arc<dyn LogStore<E>>,
    pub(super) consistent_store: Arc<dyn ConsistentStore<E>>,
    pub(super) signer: Arc<dyn TreeHeadSigner>,
    pub(super) clock: Arc<dyn Clock>,

    /// Leaves `[0, leaf_count)` in sequence order
    pub(super) tree: CompactMerkleTree,

    /// Newest head produced or recovered by this node
    pub(super) latest_tree_head: Option<SignedTreeHead>,
}

impl<E: Loggable> TreeSigner<E> {
    /// Restore the tree from the local log store and check it against the
    /// last stored head
    ///
    /// # Errors
    /// * `SignerError::Coordination` / `SignerError::Storage` - collaborator failure
    /// * `SignerError::Fatal` - stored state cannot be trusted
    pub fn new(
        config: SequencerConfig,
        log_store: Arc<dyn LogStore<E>>,
        consistent_store: Arc<dyn ConsistentStore<E>>,
        signer: Arc<dyn TreeHeadSigner>,
        clock: Arc<dyn Clock>,
    ) -> SignerResult<Self> {
        let mut tree_signer = Self {
            config,
            log_store,
            consistent_store,
            signer,
            clock,
            tree: CompactMerkleTree::new(),
            latest_tree_head: None,
        };
        tree_signer.build_tree()?;
        Ok(tree_signer)
    }

    /// Timestamp of the newest known head, 0 if none
    pub fn last_published_timestamp(&self) -> u64 {
        self.latest_tree_head
            .as_ref()
            .map_or(0, |sth| sth.timestamp)
    }

    /// Newest head produced or recovered by this node
    pub fn latest_tree_head(&self) -> Option<&SignedTreeHead> {
        self.latest_tree_head.as_ref()
    }

    /// Leaves currently in the in-memory tree
    pub fn leaf_count(&self) -> u64 {
        self.tree.leaf_count()
    }

    /// Root over the in-memory tree
    pub fn current_root(&self) -> Hash {
        self.tree.current_root()
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Commit one already-numbered entry and add it to the tree
    ///
    /// The entry must carry the next tree index. A store conflict leaves the
    /// tree untouched and is reported as an outcome, not an error.
    ///
    /// # Errors
    /// * `SignerError::NotContiguous` - wrong or missing sequence number
    /// * `SignerError::Storage` - store failure
    pub fn append(&mut self, entry: &E) -> SignerResult<AppendOutcome> {
        let expected = self.tree.leaf_count();
        if entry.sequence_number() != Some(expected) {
            return Err(SignerError::NotContiguous {
                expected,
                actual: entry.sequence_number(),
            });
        }

        match self.log_store.create_sequenced_entry(entry)? {
            WriteResult::Ok => {}
            WriteResult::SequenceNumberAlreadyInUse => {
                error!(
                    sequence_number = expected,
                    "Attempt to assign duplicate sequence number"
                );
                return Ok(AppendOutcome::DuplicateSequenceNumber);
            }
            WriteResult::EntryAlreadyLogged => {
                error!(
                    sequence_number = expected,
                    entry_hash = %crate::merkle::short_hex(&entry.entry_hash()),
                    "Entry already logged at another index"
                );
                return Ok(AppendOutcome::AlreadyLogged);
            }
        }

        self.append_to_tree(entry);
        debug!(sequence_number = expected, "Appended entry");
        Ok(AppendOutcome::Appended)
    }

    /// Add an entry's leaf to the in-memory tree
    pub(super) fn append_to_tree(&mut self, entry: &E) {
        self.tree.add_leaf(&entry.leaf_input());
    }
}

impl<E: Loggable> std::fmt::Debug for TreeSigner<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSigner")
            .field("config", &self.config)
            .field("leaf_count", &self.tree.leaf_count())
            .field("latest_tree_head", &self.latest_tree_head)
            .finish_non_exhaustive()
    }
}
