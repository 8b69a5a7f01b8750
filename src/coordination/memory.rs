//! In-memory coordination store
//!
//! One shared cluster state, many per-node handles. Used for single-node
//! deployments and for simulating several sequencers in tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::error::{CoordinationError, FatalError, SignerResult};
use crate::traits::{
    ClusterNodeState, ConsistentStore, EntryHash, LogStore, Loggable, SequenceMapping,
};

struct ClusterState<E> {
    pending: BTreeMap<EntryHash, E>,
    mapping: SequenceMapping,
    node_states: HashMap<String, ClusterNodeState>,
}

/// Coordination store handle speaking for one node
pub struct MemoryConsistentStore<E> {
    node_id: String,
    cluster: Arc<Mutex<ClusterState<E>>>,
}

impl<E: Loggable> MemoryConsistentStore<E> {
    /// Start a new cluster and return the handle for its first node
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            cluster: Arc::new(Mutex::new(ClusterState {
                pending: BTreeMap::new(),
                mapping: SequenceMapping::default(),
                node_states: HashMap::new(),
            })),
        }
    }

    /// Handle for another node of the same cluster
    pub fn peer(&self, node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            cluster: Arc::clone(&self.cluster),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Submit an entry; resubmitting the same hash is a no-op
    pub fn add_pending_entry(&self, entry: E) -> Result<(), CoordinationError> {
        let mut cluster = self.lock()?;
        cluster.pending.entry(entry.entry_hash()).or_insert(entry);
        Ok(())
    }

    /// Rebuild the mapping from the entries committed to `log_store`
    ///
    /// The in-memory cluster starts empty on every process start, so a node
    /// with a durable log must seed it before sequencing or the allocator
    /// restarts at 0. Leaves a non-empty mapping alone. Returns the number of
    /// assignments written.
    ///
    /// # Errors
    /// * `SignerError::Storage` - log store read failure
    /// * `SignerError::Coordination` - the log holds one hash twice
    /// * `FatalError::MissingEntry` - the log has a hole below its size
    pub fn seed_from_log_store(&self, log_store: &dyn LogStore<E>) -> SignerResult<u64> {
        let mut mapping = self.sequence_mapping()?;
        let size = log_store.current_committed_size()?;
        if !mapping.is_empty() || size == 0 {
            return Ok(0);
        }

        for index in 0..size {
            let entry = log_store
                .lookup_by_index(index)?
                .ok_or(FatalError::MissingEntry { index })?;
            mapping.push(entry.entry_hash(), index);
        }
        self.update_sequence_mapping(&mapping)?;

        info!(entries = size, "Sequence mapping seeded from log store");
        Ok(size)
    }

    /// Published state of any node in the cluster
    pub fn node_state(&self, node_id: &str) -> Result<Option<ClusterNodeState>, CoordinationError> {
        Ok(self.lock()?.node_states.get(node_id).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ClusterState<E>>, CoordinationError> {
        self.cluster
            .lock()
            .map_err(|_| CoordinationError::LockPoisoned)
    }
}

impl<E: Loggable> ConsistentStore<E> for MemoryConsistentStore<E> {
    fn next_available_sequence_number(&self) -> Result<u64, CoordinationError> {
        Ok(self
            .lock()?
            .mapping
            .max_sequence_number()
            .map_or(0, |max| max + 1))
    }

    fn sequence_mapping(&self) -> Result<SequenceMapping, CoordinationError> {
        Ok(self.lock()?.mapping.clone())
    }

    fn update_sequence_mapping(&self, mapping: &SequenceMapping) -> Result<(), CoordinationError> {
        let mut cluster = self.lock()?;
        let current = &cluster.mapping;

        if mapping.version() != current.version() {
            return Err(CoordinationError::Contention {
                expected: mapping.version(),
                current: current.version(),
            });
        }
        // Existing assignments must survive unchanged, in order.
        if mapping.len() < current.len()
            || mapping.mappings()[..current.len()] != *current.mappings()
        {
            return Err(CoordinationError::Rejected(
                "existing assignments may not be rewritten".into(),
            ));
        }
        let new_assignments = &mapping.mappings()[current.len()..];
        let mut numbers: HashMap<u64, EntryHash> = HashMap::new();
        let mut hashes: HashMap<EntryHash, u64> = HashMap::new();
        for m in current.mappings() {
            numbers.insert(m.sequence_number, m.entry_hash);
            hashes.insert(m.entry_hash, m.sequence_number);
        }
        for m in new_assignments {
            if numbers.insert(m.sequence_number, m.entry_hash).is_some() {
                return Err(CoordinationError::Rejected(format!(
                    "sequence number {} assigned twice",
                    m.sequence_number
                )));
            }
            if hashes.insert(m.entry_hash, m.sequence_number).is_some() {
                return Err(CoordinationError::Rejected(format!(
                    "entry {} assigned twice",
                    hex::encode(&m.entry_hash[..8])
                )));
            }
        }

        let next_version = current.version() + 1;
        cluster.mapping = SequenceMapping::new(next_version, mapping.mappings().to_vec());
        Ok(())
    }

    fn pending_entries(&self) -> Result<Vec<E>, CoordinationError> {
        Ok(self.lock()?.pending.values().cloned().collect())
    }

    fn cluster_node_state(&self) -> Result<Option<ClusterNodeState>, CoordinationError> {
        self.node_state(&self.node_id)
    }

    fn set_cluster_node_state(&self, state: &ClusterNodeState) -> Result<(), CoordinationError> {
        self.lock()?
            .node_states
            .insert(self.node_id.clone(), state.clone());
        Ok(())
    }
}
