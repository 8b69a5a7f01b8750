//! Signed tree head (STH)
//!
//! The bytes covered by the signature follow the RFC 6962 `TreeHeadSignature`
//! layout:
//!
//! ```text
//! version (1) | signature_type (1) | timestamp (8, BE) | tree_size (8, BE) | root_hash (32)
//! ```

use serde::{Deserialize, Serialize};

use crate::merkle::Hash;

/// Size of the signed blob
pub const TREE_HEAD_SIGNING_INPUT_LEN: usize = 50;

/// `SignatureType.tree_hash` from RFC 6962
const SIGNATURE_TYPE_TREE_HASH: u8 = 1;

/// Tree head format version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeHeadVersion {
    #[default]
    V1,
}

impl TreeHeadVersion {
    /// Wire value of the version byte
    pub fn as_u8(self) -> u8 {
        match self {
            TreeHeadVersion::V1 => 0,
        }
    }

    /// Parse the wire value of the version byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TreeHeadVersion::V1),
            _ => None,
        }
    }
}

/// Signed statement of the tree's size, root and time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTreeHead {
    pub version: TreeHeadVersion,

    /// Milliseconds since the Unix epoch
    pub timestamp: u64,

    /// Number of leaves covered
    pub tree_size: u64,

    /// Merkle root over `[0, tree_size)`
    #[serde(with = "hex_hash")]
    pub root_hash: Hash,

    /// Signature over [`SignedTreeHead::signing_input`]; empty until signed
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

impl SignedTreeHead {
    /// Build an unsigned V1 head
    pub fn unsigned(timestamp: u64, tree_size: u64, root_hash: Hash) -> Self {
        Self {
            version: TreeHeadVersion::V1,
            timestamp,
            tree_size,
            root_hash,
            signature: Vec::new(),
        }
    }

    /// Whether a signature has been attached
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Bytes the signature covers
    pub fn signing_input(&self) -> [u8; TREE_HEAD_SIGNING_INPUT_LEN] {
        let mut out = [0u8; TREE_HEAD_SIGNING_INPUT_LEN];
        out[0] = self.version.as_u8();
        out[1] = SIGNATURE_TYPE_TREE_HASH;
        out[2..10].copy_from_slice(&self.timestamp.to_be_bytes());
        out[10..18].copy_from_slice(&self.tree_size.to_be_bytes());
        out[18..50].copy_from_slice(&self.root_hash);
        out
    }
}

mod hex_hash {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(&s).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("root hash must be 32 bytes"))
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD.decode(s.as_bytes()).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_input_layout() {
        let sth = SignedTreeHead::unsigned(0x0102_0304_0506_0708, 7, [0xab; 32]);
        let input = sth.signing_input();

        assert_eq!(input[0], 0);
        assert_eq!(input[1], 1);
        assert_eq!(&input[2..10], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&input[10..18], &7u64.to_be_bytes());
        assert_eq!(&input[18..], &[0xab; 32]);
    }

    #[test]
    fn test_signature_not_part_of_signing_input() {
        let mut sth = SignedTreeHead::unsigned(100, 1, [1; 32]);
        let before = sth.signing_input();
        sth.signature = vec![9; 64];

        assert!(sth.is_signed());
        assert_eq!(before, sth.signing_input());
    }

    #[test]
    fn test_json_encoding() {
        let sth = SignedTreeHead {
            version: TreeHeadVersion::V1,
            timestamp: 1_700_000_000_000,
            tree_size: 3,
            root_hash: [0x11; 32],
            signature: vec![1, 2, 3],
        };

        let json = serde_json::to_value(&sth).unwrap();
        assert_eq!(json["root_hash"], "11".repeat(32));
        assert_eq!(json["signature"], "AQID");
        assert_eq!(json["tree_size"], 3);

        let parsed: SignedTreeHead = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, sth);
    }

    #[test]
    fn test_json_rejects_short_root() {
        let json = r#"{"version":"V1","timestamp":1,"tree_size":0,"root_hash":"abcd","signature":""}"#;
        assert!(serde_json::from_str::<SignedTreeHead>(json).is_err());
    }

    #[test]
    fn test_version_byte() {
        assert_eq!(TreeHeadVersion::from_u8(0), Some(TreeHeadVersion::V1));
        assert_eq!(TreeHeadVersion::from_u8(1), None);
    }
}
