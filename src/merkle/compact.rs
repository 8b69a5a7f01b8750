//! Compact append-only Merkle tree
//!
//! Only the roots of the perfect subtrees that make up the current tree are
//! kept: level `k` holds a hash iff bit `k` of the leaf count is set. Adding a
//! leaf is a binary increment with carries merged through `node_hash`.

use super::{empty_root, leaf_hash, node_hash, Hash};

/// Incremental RFC 6962 Merkle tree over leaves added in index order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactMerkleTree {
    /// Perfect subtree roots, indexed by height
    frontier: Vec<Option<Hash>>,

    /// Number of leaves appended so far
    leaf_count: u64,
}

impl CompactMerkleTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// Whether no leaf has been added yet
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Hash `data` as a leaf and append it
    ///
    /// Returns the index of the new leaf.
    pub fn add_leaf(&mut self, data: &[u8]) -> u64 {
        self.add_leaf_hash(leaf_hash(data))
    }

    /// Append an already computed leaf hash
    ///
    /// Returns the index of the new leaf.
    pub fn add_leaf_hash(&mut self, hash: Hash) -> u64 {
        let index = self.leaf_count;
        let mut carry = hash;
        let mut level = 0;

        loop {
            if level == self.frontier.len() {
                self.frontier.push(Some(carry));
                break;
            }
            match self.frontier[level].take() {
                Some(left) => {
                    carry = node_hash(&left, &carry);
                    level += 1;
                }
                None => {
                    self.frontier[level] = Some(carry);
                    break;
                }
            }
        }

        self.leaf_count += 1;
        index
    }

    /// Root hash over all leaves added so far
    pub fn current_root(&self) -> Hash {
        // Fold from the smallest subtree (rightmost) up to the largest.
        let mut root: Option<Hash> = None;
        for subtree in self.frontier.iter().flatten() {
            root = Some(match root {
                None => *subtree,
                Some(right) => node_hash(subtree, &right),
            });
        }
        root.unwrap_or_else(empty_root)
    }
}
