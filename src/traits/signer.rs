//! Signing primitive interface

use crate::error::SigningError;
use crate::tree_head::SignedTreeHead;

/// Produces signatures over tree heads
pub trait TreeHeadSigner: Send + Sync {
    /// Sign `sth.signing_input()`; the `signature` field is ignored
    ///
    /// # Errors
    /// * `SigningError` - key unavailable or signing backend failure
    fn sign_tree_head(&self, sth: &SignedTreeHead) -> Result<Vec<u8>, SigningError>;
}
