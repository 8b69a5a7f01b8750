//! Test fixtures: cluster nodes and failing collaborators

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ct_tree_signer::clock::ManualClock;
use ct_tree_signer::coordination::MemoryConsistentStore;
use ct_tree_signer::signer::Ed25519TreeHeadSigner;
use ct_tree_signer::storage::MemoryLogStore;
use ct_tree_signer::traits::{ClusterNodeState, SequenceMapping};
use ct_tree_signer::{
    ConsistentStore, CoordinationError, LogStore, LoggedEntry, SequencerConfig, SignedTreeHead,
    SignerResult, SigningError, TreeHeadSigner, TreeSigner,
};

/// Start time of every test clock
pub const START_MS: u64 = 1_700_000_000_000;

/// Signing key seed shared by all nodes of a test cluster
pub const CLUSTER_KEY: [u8; 32] = [9; 32];

pub fn entry(payload: &str, timestamp: u64) -> LoggedEntry {
    LoggedEntry::new(payload.as_bytes().to_vec(), timestamp)
}

pub fn cluster_signer() -> Arc<Ed25519TreeHeadSigner> {
    Arc::new(Ed25519TreeHeadSigner::from_bytes(&CLUSTER_KEY))
}

/// One sequencer node with its own log store
pub struct Node {
    pub id: String,
    pub log_store: Arc<MemoryLogStore<LoggedEntry>>,
    pub consistent: Arc<FlakyConsistentStore>,
    pub clock: Arc<ManualClock>,
}

impl Node {
    pub fn tree_signer(&self, guard_window_ms: u64) -> SignerResult<TreeSigner<LoggedEntry>> {
        TreeSigner::new(
            SequencerConfig::with_guard_window_ms(guard_window_ms),
            self.log_store.clone(),
            self.consistent.clone(),
            cluster_signer(),
            self.clock.clone(),
        )
    }
}

/// Nodes sharing one coordination store and one clock
pub struct Cluster {
    pub coordination: MemoryConsistentStore<LoggedEntry>,
    pub clock: Arc<ManualClock>,
}

impl Cluster {
    pub fn new() -> Self {
        Self {
            coordination: MemoryConsistentStore::new("submitter"),
            clock: Arc::new(ManualClock::new(START_MS)),
        }
    }

    pub fn node(&self, id: &str) -> Node {
        Node {
            id: id.to_string(),
            log_store: Arc::new(MemoryLogStore::new()),
            consistent: Arc::new(FlakyConsistentStore::new(self.coordination.peer(id))),
            clock: self.clock.clone(),
        }
    }

    pub fn submit(&self, entry: &LoggedEntry) {
        self.coordination
            .add_pending_entry(entry.clone())
            .expect("submit pending entry");
    }
}

/// Coordination store handle that can be switched off
pub struct FlakyConsistentStore {
    inner: MemoryConsistentStore<LoggedEntry>,
    down: AtomicBool,
}

impl FlakyConsistentStore {
    pub fn new(inner: MemoryConsistentStore<LoggedEntry>) -> Self {
        Self {
            inner,
            down: AtomicBool::new(false),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CoordinationError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CoordinationError::Unavailable("quorum lost".into()));
        }
        Ok(())
    }
}

impl ConsistentStore<LoggedEntry> for FlakyConsistentStore {
    fn next_available_sequence_number(&self) -> Result<u64, CoordinationError> {
        self.check()?;
        self.inner.next_available_sequence_number()
    }

    fn sequence_mapping(&self) -> Result<SequenceMapping, CoordinationError> {
        self.check()?;
        self.inner.sequence_mapping()
    }

    fn update_sequence_mapping(&self, mapping: &SequenceMapping) -> Result<(), CoordinationError> {
        self.check()?;
        self.inner.update_sequence_mapping(mapping)
    }

    fn pending_entries(&self) -> Result<Vec<LoggedEntry>, CoordinationError> {
        self.check()?;
        self.inner.pending_entries()
    }

    fn cluster_node_state(&self) -> Result<Option<ClusterNodeState>, CoordinationError> {
        self.check()?;
        self.inner.cluster_node_state()
    }

    fn set_cluster_node_state(&self, state: &ClusterNodeState) -> Result<(), CoordinationError> {
        self.check()?;
        self.inner.set_cluster_node_state(state)
    }
}

/// Signer that always refuses
pub struct FailingSigner;

impl TreeHeadSigner for FailingSigner {
    fn sign_tree_head(&self, _sth: &SignedTreeHead) -> Result<Vec<u8>, SigningError> {
        Err(SigningError("signing key unavailable".into()))
    }
}

/// Every committed entry of a store, in index order
pub fn committed_entries(store: &dyn LogStore<LoggedEntry>) -> Vec<LoggedEntry> {
    let size = store.current_committed_size().expect("committed size");
    (0..size)
        .map(|i| {
            store
                .lookup_by_index(i)
                .expect("lookup")
                .expect("entry present below committed size")
        })
        .collect()
}
