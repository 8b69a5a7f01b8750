//! Trait definitions for entries and the engine's collaborators

pub mod consistent;
pub mod entry;
pub mod signer;
pub mod storage;

pub use consistent::{ClusterNodeState, ConsistentStore, Mapping, SequenceMapping};
pub use entry::{EntryHash, Loggable, LoggedEntry};
pub use signer::TreeHeadSigner;
pub use storage::{LogStore, WriteResult};
