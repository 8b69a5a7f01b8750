//! Tree head signing implementations

mod ed25519;

pub use ed25519::{verify_tree_head, Ed25519TreeHeadSigner};
