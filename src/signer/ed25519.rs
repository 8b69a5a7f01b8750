//! Ed25519 tree head signer

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::SigningError;
use crate::traits::TreeHeadSigner;
use crate::tree_head::SignedTreeHead;

/// Signs tree heads with an Ed25519 key
///
/// The key id is the SHA-256 of the public key.
#[derive(Clone)]
pub struct Ed25519TreeHeadSigner {
    signing_key: SigningKey,
    key_id: [u8; 32],
}

impl Ed25519TreeHeadSigner {
    #[must_use]
    pub fn new(signing_key: SigningKey) -> Self {
        let key_id = Sha256::digest(signing_key.verifying_key().as_bytes()).into();
        Self {
            signing_key,
            key_id,
        }
    }

    /// Create signer from raw 32-byte seed
    #[must_use]
    pub fn from_bytes(seed: &[u8; 32]) -> Self {
        Self::new(SigningKey::from_bytes(seed))
    }

    /// Create signer from file containing Ed25519 seed
    ///
    /// # Errors
    /// Returns error if file cannot be read or is not exactly 32 bytes
    pub fn from_file(path: &str) -> Result<Self, std::io::Error> {
        let seed_bytes = std::fs::read(path)?;
        let seed: [u8; 32] = seed_bytes.as_slice().try_into().map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("signing key must be 32 bytes, got {}", seed_bytes.len()),
            )
        })?;
        Ok(Self::from_bytes(&seed))
    }

    #[must_use]
    pub const fn key_id(&self) -> &[u8; 32] {
        &self.key_id
    }

    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl TreeHeadSigner for Ed25519TreeHeadSigner {
    fn sign_tree_head(&self, sth: &SignedTreeHead) -> Result<Vec<u8>, SigningError> {
        let signature = self.signing_key.sign(&sth.signing_input());
        Ok(signature.to_bytes().to_vec())
    }
}

impl std::fmt::Debug for Ed25519TreeHeadSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519TreeHeadSigner")
            .field("key_id", &hex::encode(self.key_id))
            .finish_non_exhaustive()
    }
}

/// Check a head's signature against a public key
pub fn verify_tree_head(key: &VerifyingKey, sth: &SignedTreeHead) -> bool {
    let Ok(bytes) = <[u8; 64]>::try_from(sth.signature.as_slice()) else {
        return false;
    };
    key.verify(&sth.signing_input(), &Signature::from_bytes(&bytes))
        .is_ok()
}
