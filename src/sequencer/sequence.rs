//! Sequence number assignment for pending entries

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry as MapEntry;

use tracing::{debug, info, warn};

use crate::error::{FatalError, SignerResult};
use crate::merkle::short_hex;
use crate::traits::{Loggable, WriteResult};

use super::core::TreeSigner;

/// What one sequencing round did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SequencingReport {
    /// Entries given a fresh sequence number this round
    pub newly_sequenced: u64,

    /// Entries that already had a number in the cluster mapping
    pub adopted: u64,

    /// Entries left for a later round because of the guard window
    pub deferred: u64,

    /// Entries written to the local log store
    pub committed: u64,

    /// Numbered entries held back because an earlier number is missing locally
    pub awaiting_gap: u64,

    /// Fresh numbers that fell inside the already committed range and so can
    /// never be committed here
    pub below_committed: u64,
}

/// Pending entry order: submission time, then hash
pub(super) fn pending_order<E: Loggable>(x: &E, y: &E) -> Ordering {
    x.timestamp()
        .cmp(&y.timestamp())
        .then_with(|| x.entry_hash().cmp(&y.entry_hash()))
}

impl<E: Loggable> TreeSigner<E> {
    /// Number pending entries and commit them to the local log store
    ///
    /// Entries whose hash is already mapped keep their number; the rest take
    /// fresh numbers from the cluster allocator. The updated mapping is written
    /// back before anything is committed locally, and local commits only
    /// extend the store contiguously.
    ///
    /// # Errors
    /// * `SignerError::Coordination` - allocator, mapping or pending read/write
    ///   failed; nothing was committed
    /// * `SignerError::Storage` - local commit failed part way; the store stays
    ///   gap-free and the next round resumes
    /// * `SignerError::Fatal` - mapping or store contradicts itself
    pub fn sequence_new_entries(&mut self) -> SignerResult<SequencingReport> {
        let now = self.clock.now_millis();
        let mut report = SequencingReport::default();

        let mut next_sequence_number = self.consistent_store.next_available_sequence_number()?;
        debug!(next_sequence_number, "Next available sequence number");

        let mut mapping = self.consistent_store.sequence_mapping()?;
        let mut sequenced_hashes = mapping.to_lookup().map_err(|hash| {
            FatalError::Inconsistency(format!(
                "entry {} appears twice in the sequence mapping",
                hex::encode(hash)
            ))
        })?;

        let mut pending_entries = self.consistent_store.pending_entries()?;
        pending_entries.sort_by(pending_order);
        debug!(pending = pending_entries.len(), "Sequencing pending entries");

        let mut seq_to_entry: BTreeMap<u64, E> = BTreeMap::new();
        let mut claimed_numbers = Vec::new();
        for mut entry in pending_entries {
            let hash = entry.entry_hash();

            // Too young: other nodes may not see it yet, so they could order
            // it differently.
            if now < entry.timestamp().saturating_add(self.config.guard_window_ms) {
                debug!(entry_hash = %short_hex(&hash), "Entry too recent");
                report.deferred += 1;
                continue;
            }

            let sequence_number = match sequenced_hashes.get(&hash) {
                Some(&existing) => {
                    debug!(
                        entry_hash = %short_hex(&hash),
                        sequence_number = existing,
                        "Previously sequenced"
                    );
                    report.adopted += 1;
                    existing
                }
                None => {
                    let claimed = next_sequence_number;
                    debug!(
                        entry_hash = %short_hex(&hash),
                        sequence_number = claimed,
                        "Sequenced"
                    );
                    mapping.push(hash, claimed);
                    sequenced_hashes.insert(hash, claimed);
                    claimed_numbers.push(claimed);
                    next_sequence_number += 1;
                    report.newly_sequenced += 1;
                    claimed
                }
            };
            entry.set_sequence_number(sequence_number);

            match seq_to_entry.entry(sequence_number) {
                MapEntry::Vacant(slot) => {
                    slot.insert(entry);
                }
                MapEntry::Occupied(slot) if slot.get().entry_hash() == hash => {}
                MapEntry::Occupied(slot) => {
                    return Err(FatalError::Inconsistency(format!(
                        "sequence number {} claimed by {} and {}",
                        sequence_number,
                        short_hex(&slot.get().entry_hash()),
                        short_hex(&hash)
                    ))
                    .into());
                }
            }
        }

        if report.newly_sequenced > 0 {
            self.consistent_store.update_sequence_mapping(&mapping)?;
        }

        let committed_size = self.log_store.current_committed_size()?;
        report.below_committed = claimed_numbers
            .iter()
            .filter(|&&n| n < committed_size)
            .count() as u64;
        if report.below_committed > 0 {
            warn!(
                committed_size,
                below_committed = report.below_committed,
                "Allocator handed out numbers the local log already holds"
            );
        }

        self.commit_contiguous(committed_size, &mut seq_to_entry, &mut report)?;

        info!(
            newly_sequenced = report.newly_sequenced,
            adopted = report.adopted,
            deferred = report.deferred,
            committed = report.committed,
            awaiting_gap = report.awaiting_gap,
            below_committed = report.below_committed,
            "Sequencing round complete"
        );
        Ok(report)
    }

    /// Commit numbered entries starting at `start`, the store's size, stopping
    /// at the first missing number
    fn commit_contiguous(
        &self,
        start: u64,
        seq_to_entry: &mut BTreeMap<u64, E>,
        report: &mut SequencingReport,
    ) -> SignerResult<()> {
        let mut next = start;

        while let Some(entry) = seq_to_entry.remove(&next) {
            match self.log_store.create_sequenced_entry(&entry)? {
                WriteResult::Ok => {
                    debug!(sequence_number = next, "Added to local log store");
                    report.committed += 1;
                    next += 1;
                }
                WriteResult::SequenceNumberAlreadyInUse => {
                    return Err(FatalError::Inconsistency(format!(
                        "log store reported size {} but index {} is taken",
                        start, next
                    ))
                    .into());
                }
                WriteResult::EntryAlreadyLogged => {
                    return Err(FatalError::Inconsistency(format!(
                        "entry {} mapped to {} is already logged at another index",
                        short_hex(&entry.entry_hash()),
                        next
                    ))
                    .into());
                }
            }
        }

        report.awaiting_gap = seq_to_entry.range(next..).count() as u64;
        if report.awaiting_gap > 0 {
            warn!(
                committed_size = next,
                awaiting = report.awaiting_gap,
                "Sequenced entries waiting on a missing earlier number"
            );
        }
        Ok(())
    }
}
