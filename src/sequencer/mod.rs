//! Sequencer module - numbering, tree building and head signing
//!
//! [`TreeSigner`] owns the in-memory Merkle accumulator of one node. It turns
//! pending entries into gap-free, committed entries and committed entries into
//! signed tree heads. Calls must be serialized by the caller; `&mut self`
//! enforces that within a process.

mod config;
mod core;
mod recovery;
mod sequence;
mod update;


pub use config::{SequencerConfig, DEFAULT_GUARD_WINDOW_MS};
pub use core::{AppendOutcome, TreeSigner};
pub use sequence::SequencingReport;
