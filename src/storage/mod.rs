//! Local log store backends
//!
//! - [`MemoryLogStore`]: process-local, for tests and simulations
//! - [`SqliteLogStore`]: durable single-file store

mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryLogStore;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConfig, SqliteLogStore};
