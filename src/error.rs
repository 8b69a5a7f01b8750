//! Tree signer error types
//!
//! Errors come in two tiers. Environmental failures (coordination store,
//! local log store) are returned to the caller and leave in-memory state
//! untouched, so the whole operation can be retried. [`FatalError`] marks
//! durable state or a clock that can no longer be trusted; the driver must
//! stop signing and wait for an operator.

use thiserror::Error;

/// Main error type returned by [`crate::TreeSigner`] operations
#[derive(Debug, Error)]
pub enum SignerError {
    /// Coordination store call failed
    #[error("coordination store error: {0}")]
    Coordination(#[from] CoordinationError),

    /// Local log store call failed
    #[error("log store error: {0}")]
    Storage(#[from] StorageError),

    /// Entry handed to `append` does not continue the tree
    #[error("entry sequence number {actual:?} does not continue tree of size {expected}")]
    NotContiguous { expected: u64, actual: Option<u64> },

    /// Unrecoverable state, stop serving
    #[error("fatal: {0}")]
    Fatal(#[from] FatalError),
}

/// Invariant violations that must halt the log
#[derive(Debug, Error)]
pub enum FatalError {
    /// Stored tree head claims a time after now
    #[error("stored tree head timestamp {timestamp} is in the future (now {now})")]
    FutureTimestamp { timestamp: u64, now: u64 },

    /// Replayed leaves do not reproduce the stored root
    #[error("root hash mismatch at tree size {tree_size}: stored {expected}, rebuilt {actual}")]
    RootHashMismatch {
        tree_size: u64,
        expected: String,
        actual: String,
    },

    /// The signing primitive refused to sign a head
    #[error("tree head signing failed: {0}")]
    SigningFailed(#[from] SigningError),

    /// An index covered by the stored head is absent from the log store
    #[error("entry {index} covered by the stored tree head is missing")]
    MissingEntry { index: u64 },

    /// Entry stored at `expected` records a different sequence number
    #[error("entry at index {expected} records sequence number {actual:?}")]
    IndexMismatch { expected: u64, actual: Option<u64> },

    /// A signed entry is newer than the head that covers it
    #[error("entry {index} timestamp {entry_timestamp} is newer than tree head timestamp {head_timestamp}")]
    EntryNewerThanHead {
        index: u64,
        entry_timestamp: u64,
        head_timestamp: u64,
    },

    /// Any other bookkeeping contradiction
    #[error("inconsistent state: {0}")]
    Inconsistency(String),
}

/// Local log store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Could not open or reach the database
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Entry written without a sequence number
    #[error("entry has no sequence number")]
    MissingSequenceNumber,

    /// Lock guarding the store was poisoned
    #[error("storage lock poisoned")]
    LockPoisoned,

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Coordination store errors
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// Store unreachable
    #[error("coordination store unavailable: {0}")]
    Unavailable(String),

    /// Write lost a compare-and-set race against another node
    #[error("sequence mapping version {expected} is stale (current {current})")]
    Contention { expected: u64, current: u64 },

    /// Write would rewrite an existing hash -> number assignment
    #[error("sequence mapping rejected: {0}")]
    Rejected(String),

    /// Lock guarding the store was poisoned
    #[error("coordination lock poisoned")]
    LockPoisoned,
}

/// Signing primitive error
#[derive(Debug, Error)]
#[error("signing error: {0}")]
pub struct SigningError(pub String);

/// Result alias for tree signer operations
pub type SignerResult<T> = Result<T, SignerError>;

impl SignerError {
    /// True when the driver must stop and require operator intervention
    pub fn is_fatal(&self) -> bool {
        matches!(self, SignerError::Fatal(_))
    }

    /// True when retrying the whole operation later can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            SignerError::Coordination(CoordinationError::LockPoisoned) => false,
            SignerError::Coordination(_) => true,
            SignerError::Storage(StorageError::LockPoisoned) => false,
            SignerError::Storage(_) => true,
            SignerError::NotContiguous { .. } | SignerError::Fatal(_) => false,
        }
    }

    /// Stable error code for logs and metrics labels
    pub fn error_code(&self) -> &'static str {
        match self {
            SignerError::Coordination(CoordinationError::Contention { .. }) => {
                "COORDINATION_CONTENTION"
            }
            SignerError::Coordination(_) => "COORDINATION_ERROR",
            SignerError::Storage(_) => "STORAGE_ERROR",
            SignerError::NotContiguous { .. } => "NOT_CONTIGUOUS",
            SignerError::Fatal(FatalError::FutureTimestamp { .. }) => "FUTURE_TIMESTAMP",
            SignerError::Fatal(FatalError::RootHashMismatch { .. }) => "ROOT_HASH_MISMATCH",
            SignerError::Fatal(FatalError::SigningFailed(_)) => "SIGNING_FAILED",
            SignerError::Fatal(_) => "INCONSISTENT_STATE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_are_not_recoverable() {
        let err: SignerError = FatalError::MissingEntry { index: 3 }.into();
        assert!(err.is_fatal());
        assert!(!err.is_recoverable());
        assert_eq!(err.error_code(), "INCONSISTENT_STATE");
    }

    #[test]
    fn test_environmental_errors_are_recoverable() {
        let err: SignerError = CoordinationError::Unavailable("etcd down".into()).into();
        assert!(!err.is_fatal());
        assert!(err.is_recoverable());

        let err: SignerError = StorageError::ConnectionFailed("disk gone".into()).into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_poisoned_locks_are_not_recoverable() {
        let err: SignerError = StorageError::LockPoisoned.into();
        assert!(!err.is_fatal());
        assert!(!err.is_recoverable());

        let err: SignerError = CoordinationError::LockPoisoned.into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_not_contiguous_is_not_recoverable() {
        let err = SignerError::NotContiguous {
            expected: 0,
            actual: None,
        };
        assert!(!err.is_fatal());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_contention_error_code() {
        let err: SignerError = CoordinationError::Contention {
            expected: 1,
            current: 2,
        }
        .into();
        assert_eq!(err.error_code(), "COORDINATION_CONTENTION");
        assert!(err.to_string().contains("stale"));
    }

    #[test]
    fn test_signing_failure_is_fatal() {
        let err: SignerError = FatalError::SigningFailed(SigningError("hsm offline".into())).into();
        assert!(err.is_fatal());
        assert_eq!(err.error_code(), "SIGNING_FAILED");
        assert!(err.to_string().contains("hsm offline"));
    }

    #[test]
    fn test_not_contiguous_display() {
        let err = SignerError::NotContiguous {
            expected: 4,
            actual: Some(6),
        };
        assert_eq!(
            err.to_string(),
            "entry sequence number Some(6) does not continue tree of size 4"
        );
    }
}
