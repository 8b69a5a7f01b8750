//! Log entry capability

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content hash identifying an entry
pub type EntryHash = [u8; 32];

/// What the engine needs from a submitted record
///
/// Entries are opaque: the engine never inspects their content beyond the
/// hash, timestamp and leaf encoding.
pub trait Loggable: Clone + Send + Sync + 'static {
    /// Stable content hash; identity of the entry
    fn entry_hash(&self) -> EntryHash;

    /// Submission time in milliseconds since the Unix epoch
    fn timestamp(&self) -> u64;

    /// Assigned sequence number, if any
    fn sequence_number(&self) -> Option<u64>;

    /// Fill in the sequence number
    fn set_sequence_number(&mut self, sequence_number: u64);

    /// Canonical bytes hashed into the Merkle leaf
    fn leaf_input(&self) -> Vec<u8>;
}

/// Default entry type: an opaque payload plus its submission time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEntry {
    /// Already validated submission bytes
    pub payload: Vec<u8>,

    /// Submission time (ms)
    pub timestamp: u64,

    /// Position in the log once sequenced
    pub sequence_number: Option<u64>,
}

impl LoggedEntry {
    /// Create an unsequenced entry
    pub fn new(payload: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self {
            payload: payload.into(),
            timestamp,
            sequence_number: None,
        }
    }

    /// Builder-style sequence number assignment
    pub fn with_sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }
}

impl Loggable for LoggedEntry {
    fn entry_hash(&self) -> EntryHash {
        Sha256::digest(&self.payload).into()
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn sequence_number(&self) -> Option<u64> {
        self.sequence_number
    }

    fn set_sequence_number(&mut self, sequence_number: u64) {
        self.sequence_number = Some(sequence_number);
    }

    fn leaf_input(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.payload.len());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}
