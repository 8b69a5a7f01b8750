//! Tree extension and head signing

use tracing::{info, warn};

use crate::error::{FatalError, SignerResult};
use crate::merkle::short_hex;
use crate::traits::Loggable;
use crate::tree_head::SignedTreeHead;

use super::core::TreeSigner;

impl<E: Loggable> TreeSigner<E> {
    /// Add newly committed entries to the tree and sign a new head
    ///
    /// The head is kept as this node's latest and returned; persisting and
    /// publishing it is up to the caller.
    ///
    /// # Errors
    /// * `SignerError::Storage` - log store read failure (tree may have grown;
    ///   the next call continues from there)
    /// * `SignerError::Fatal` - index mismatch in the store or signing failure
    pub fn update_tree(&mut self) -> SignerResult<SignedTreeHead> {
        // Local heads get unique timestamps; heads from different nodes may
        // still collide, which serving-head selection has to cope with.
        let tail = self.replay_committed_tail()?;
        let min_timestamp = self
            .last_published_timestamp()
            .saturating_add(1)
            .max(tail.max_timestamp);

        let sth = self.timestamp_and_sign(min_timestamp)?;
        info!(
            tree_size = sth.tree_size,
            timestamp = sth.timestamp,
            new_entries = tail.count,
            root_hash = %short_hex(&sth.root_hash),
            "Signed new tree head"
        );

        self.latest_tree_head = Some(sth.clone());
        Ok(sth)
    }

    /// Build and sign a head over the current tree, stamped no earlier than
    /// `min_timestamp`
    ///
    /// # Errors
    /// * `FatalError::SigningFailed` - the signer refused; there is no
    ///   unsigned fallback
    pub(super) fn timestamp_and_sign(&self, min_timestamp: u64) -> Result<SignedTreeHead, FatalError> {
        let now = self.clock.now_millis();
        if now < min_timestamp {
            warn!(
                now,
                min_timestamp,
                skew_ms = min_timestamp - now,
                "Clock behind timestamp floor, raising tree head timestamp"
            );
        }

        let mut sth = SignedTreeHead::unsigned(
            now.max(min_timestamp),
            self.tree.leaf_count(),
            self.tree.current_root(),
        );
        sth.signature = self.signer.sign_tree_head(&sth)?;
        Ok(sth)
    }
}
