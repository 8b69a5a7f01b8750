//! ct-tree-signer library exports
//!
//! Sequencing and signing core of an append-only transparency log: assigns
//! gap-free sequence numbers to submitted entries across a cluster, maintains
//! the RFC 6962 Merkle tree over committed entries and produces signed tree
//! heads with strictly increasing timestamps.

pub mod background;
pub mod clock;
pub mod coordination;
pub mod error;
pub mod merkle;
pub mod sequencer;
pub mod signer;
pub mod storage;
pub mod traits;
pub mod tree_head;

// Re-exports
pub use error::{CoordinationError, FatalError, SignerError, SignerResult, SigningError, StorageError};
pub use sequencer::{AppendOutcome, SequencerConfig, SequencingReport, TreeSigner};
pub use traits::{ConsistentStore, LogStore, Loggable, LoggedEntry, TreeHeadSigner, WriteResult};
pub use tree_head::SignedTreeHead;

#[cfg(feature = "sqlite")]
pub use storage::SqliteLogStore;
