//! Periodic driver for the tree signer
//!
//! [`SignerJob`] owns one node's [`crate::TreeSigner`] and runs two timers:
//! sequencing rounds move pending entries into the log store, signing rounds
//! extend the tree and publish a fresh head. Recoverable failures are logged
//! and retried on the next tick. Any other error stops the job.

pub mod config;
pub mod job;
pub mod logic;

pub use config::JobConfig;
pub use job::SignerJob;
