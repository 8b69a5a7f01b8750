//! Cluster-wide coordination store interface

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoordinationError;
use crate::traits::entry::{EntryHash, Loggable};
use crate::tree_head::SignedTreeHead;

/// One `hash -> sequence number` assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub entry_hash: EntryHash,
    pub sequence_number: u64,
}

/// Append-only, versioned table of sequence number assignments
///
/// `version` is the store revision this snapshot was read at. Writing it back
/// is a compare-and-set against that revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMapping {
    version: u64,
    mappings: Vec<Mapping>,
}

impl SequenceMapping {
    /// Snapshot at a store revision
    pub fn new(version: u64, mappings: Vec<Mapping>) -> Self {
        Self { version, mappings }
    }

    /// Store revision this snapshot was read at
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Record a new assignment
    pub fn push(&mut self, entry_hash: EntryHash, sequence_number: u64) {
        self.mappings.push(Mapping {
            entry_hash,
            sequence_number,
        });
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Highest assigned sequence number
    pub fn max_sequence_number(&self) -> Option<u64> {
        self.mappings.iter().map(|m| m.sequence_number).max()
    }

    /// Index by hash, `Err(hash)` on the first hash mapped twice
    pub fn to_lookup(&self) -> Result<HashMap<EntryHash, u64>, EntryHash> {
        let mut lookup = HashMap::with_capacity(self.mappings.len());
        for m in &self.mappings {
            if lookup.insert(m.entry_hash, m.sequence_number).is_some() {
                return Err(m.entry_hash);
            }
        }
        Ok(lookup)
    }
}

/// State a node publishes to the rest of the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNodeState {
    pub node_id: String,

    /// Newest head this node has produced
    pub newest_sth: Option<SignedTreeHead>,
}

/// Cluster-wide store of pending entries and sequence number ownership
///
/// Calls block. Each handle speaks for one node, which determines what
/// [`ConsistentStore::cluster_node_state`] returns.
pub trait ConsistentStore<E: Loggable>: Send + Sync {
    /// Lowest sequence number not yet assigned cluster-wide
    fn next_available_sequence_number(&self) -> Result<u64, CoordinationError>;

    /// Current assignments
    fn sequence_mapping(&self) -> Result<SequenceMapping, CoordinationError>;

    /// Write back assignments read via [`ConsistentStore::sequence_mapping`]
    ///
    /// # Errors
    /// * `CoordinationError::Contention` - mapping changed since it was read
    /// * `CoordinationError::Rejected` - an existing assignment was altered
    fn update_sequence_mapping(&self, mapping: &SequenceMapping) -> Result<(), CoordinationError>;

    /// Entries submitted but not yet sequenced
    fn pending_entries(&self) -> Result<Vec<E>, CoordinationError>;

    /// This node's last published state, `None` if it never published
    fn cluster_node_state(&self) -> Result<Option<ClusterNodeState>, CoordinationError>;

    /// Publish this node's state
    fn set_cluster_node_state(&self, state: &ClusterNodeState) -> Result<(), CoordinationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::LoggedEntry;

    // Compile-time test: trait is object-safe
    fn _assert_object_safe(_: &dyn ConsistentStore<LoggedEntry>) {}

    #[test]
    fn test_lookup_from_mapping() {
        let mut mapping = SequenceMapping::new(3, vec![]);
        mapping.push([1; 32], 0);
        mapping.push([2; 32], 1);

        let lookup = mapping.to_lookup().unwrap();
        assert_eq!(lookup.get(&[1; 32]), Some(&0));
        assert_eq!(lookup.get(&[2; 32]), Some(&1));
        assert_eq!(mapping.version(), 3);
        assert_eq!(mapping.max_sequence_number(), Some(1));
    }

    #[test]
    fn test_lookup_reports_duplicate_hash() {
        let mut mapping = SequenceMapping::default();
        mapping.push([7; 32], 0);
        mapping.push([7; 32], 5);

        assert_eq!(mapping.to_lookup(), Err([7; 32]));
    }

    #[test]
    fn test_empty_mapping() {
        let mapping = SequenceMapping::default();
        assert!(mapping.is_empty());
        assert_eq!(mapping.max_sequence_number(), None);
    }
}
