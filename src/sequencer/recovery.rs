//! Construction-time tree rebuild
//!
//! Replays the local log store into the accumulator:
//! 1. Seed the latest head from this node's published cluster state
//! 2. Replay `[0, stored_head.tree_size)` and check the root against the stored head
//! 3. Replay any entries committed after that head (crash between commit and sign)

use tracing::{debug, info};

use crate::error::{FatalError, SignerResult};
use crate::merkle::short_hex;
use crate::traits::Loggable;
use crate::tree_head::SignedTreeHead;

use super::core::TreeSigner;

/// Log a progress line every this many replayed entries
const PROGRESS_INTERVAL: u64 = 100_000;

impl<E: Loggable> TreeSigner<E> {
    pub(super) fn build_tree(&mut self) -> SignerResult<()> {
        debug_assert!(self.tree.is_empty(), "tree already built");

        let published = self
            .consistent_store
            .cluster_node_state()?
            .and_then(|state| state.newest_sth);
        if let Some(sth) = &published {
            self.check_not_future(sth)?;
            debug!(
                tree_size = sth.tree_size,
                timestamp = sth.timestamp,
                "Found previously published tree head"
            );
        }

        let stored = self.log_store.latest_tree_head()?;
        if let Some(sth) = &stored {
            self.replay_signed_prefix(sth)?;
        }

        self.latest_tree_head = match (stored, published) {
            (Some(stored), Some(published)) if published.timestamp > stored.timestamp => {
                Some(published)
            }
            (Some(stored), _) => Some(stored),
            (None, published) => published,
        };

        let signed_size = self.tree.leaf_count();
        let replayed = self.replay_committed_tail()?;
        info!(
            signed_size,
            unsigned_tail = replayed.count,
            tree_size = self.tree.leaf_count(),
            "Tree rebuilt from local log store"
        );
        Ok(())
    }

    /// Replay the entries covered by `sth` and verify its root
    fn replay_signed_prefix(&mut self, sth: &SignedTreeHead) -> SignerResult<()> {
        self.check_not_future(sth)?;

        for index in 0..sth.tree_size {
            let entry = self
                .log_store
                .lookup_by_index(index)?
                .ok_or(FatalError::MissingEntry { index })?;
            check_position(&entry, index)?;
            if entry.timestamp() > sth.timestamp {
                return Err(FatalError::EntryNewerThanHead {
                    index,
                    entry_timestamp: entry.timestamp(),
                    head_timestamp: sth.timestamp,
                }
                .into());
            }

            self.append_to_tree(&entry);
            if index % PROGRESS_INTERVAL == 0 {
                info!(index, tree_size = sth.tree_size, "Replaying signed entries");
            }
        }

        let root = self.tree.current_root();
        if root != sth.root_hash {
            return Err(FatalError::RootHashMismatch {
                tree_size: sth.tree_size,
                expected: hex::encode(sth.root_hash),
                actual: hex::encode(root),
            }
            .into());
        }

        info!(
            tree_size = sth.tree_size,
            root_hash = %short_hex(&root),
            "Stored tree head verified"
        );
        Ok(())
    }

    /// A head from the future means storage or the clock is corrupt, and it
    /// would become the floor for every later head
    fn check_not_future(&self, sth: &SignedTreeHead) -> Result<(), FatalError> {
        let now = self.clock.now_millis();
        if sth.timestamp > now {
            return Err(FatalError::FutureTimestamp {
                timestamp: sth.timestamp,
                now,
            });
        }
        Ok(())
    }

    /// Append every committed entry past the current leaf count
    pub(super) fn replay_committed_tail(&mut self) -> SignerResult<TailReplay> {
        let mut replay = TailReplay::default();
        let mut index = self.tree.leaf_count();

        while let Some(entry) = self.log_store.lookup_by_index(index)? {
            check_position(&entry, index)?;
            replay.max_timestamp = replay.max_timestamp.max(entry.timestamp());
            self.append_to_tree(&entry);
            replay.count += 1;
            index += 1;
        }

        Ok(replay)
    }
}

/// Summary of [`TreeSigner::replay_committed_tail`]
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct TailReplay {
    pub count: u64,

    /// Newest submission timestamp among the replayed entries, 0 if none
    pub max_timestamp: u64,
}

/// The entry stored at `index` must record that index
fn check_position<E: Loggable>(entry: &E, index: u64) -> Result<(), FatalError> {
    if entry.sequence_number() != Some(index) {
        return Err(FatalError::IndexMismatch {
            expected: index,
            actual: entry.sequence_number(),
        });
    }
    Ok(())
}
