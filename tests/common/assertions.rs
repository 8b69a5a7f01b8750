//! Custom test assertions for stores and tree heads

use ct_tree_signer::merkle::CompactMerkleTree;
use ct_tree_signer::signer::verify_tree_head;
use ct_tree_signer::{LogStore, Loggable, LoggedEntry, SignedTreeHead};

use super::fixtures::{cluster_signer, committed_entries};

/// Assert that two log stores hold the same entries at the same indices
pub fn assert_same_log(a: &dyn LogStore<LoggedEntry>, b: &dyn LogStore<LoggedEntry>) {
    let left = committed_entries(a);
    let right = committed_entries(b);
    assert_eq!(left.len(), right.len(), "Stores should hold the same number of entries");
    for (i, (x, y)) in left.iter().zip(&right).enumerate() {
        assert_eq!(x.entry_hash(), y.entry_hash(), "Entry {} differs between stores", i);
    }
}

/// Assert that a head is signed by the cluster key and covers the store prefix
pub fn assert_head_covers_store(sth: &SignedTreeHead, store: &dyn LogStore<LoggedEntry>) {
    assert!(
        verify_tree_head(&cluster_signer().verifying_key(), sth),
        "Tree head signature should verify"
    );

    let entries = committed_entries(store);
    assert!(
        entries.len() as u64 >= sth.tree_size,
        "Store should hold every entry the head covers"
    );

    let mut tree = CompactMerkleTree::new();
    for e in &entries[..sth.tree_size as usize] {
        tree.add_leaf(&e.leaf_input());
    }
    assert_eq!(tree.current_root(), sth.root_hash, "Root should match the store prefix");
}

/// Assert that indices `[0, size)` are present and record their own index
pub fn assert_gap_free(store: &dyn LogStore<LoggedEntry>) {
    for (i, e) in committed_entries(store).iter().enumerate() {
        assert_eq!(e.sequence_number(), Some(i as u64), "Entry at {} has wrong index", i);
    }
}
