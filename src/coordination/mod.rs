//! Coordination store backends

mod memory;

pub use memory::MemoryConsistentStore;
