//! Per-tick work of the signer job
//!
//! Plain blocking functions; [`super::SignerJob`] runs them on the blocking
//! pool.

use std::sync::{Mutex, MutexGuard};

use crate::error::{FatalError, SignerError, SignerResult};
use crate::sequencer::{SequencingReport, TreeSigner};
use crate::traits::{ClusterNodeState, ConsistentStore, LogStore, Loggable};
use crate::tree_head::SignedTreeHead;

/// One sequencing round
pub fn run_sequencing<E: Loggable>(tree_signer: &Mutex<TreeSigner<E>>) -> SignerResult<SequencingReport> {
    lock(tree_signer)?.sequence_new_entries()
}

/// One signing round: sign, persist locally, then publish to the cluster
///
/// A head that was signed but could not be stored or published is still this
/// node's latest head, so the next round is stamped after it.
pub fn run_signing<E: Loggable>(
    tree_signer: &Mutex<TreeSigner<E>>,
    log_store: &dyn LogStore<E>,
    consistent_store: &dyn ConsistentStore<E>,
    node_id: &str,
) -> SignerResult<SignedTreeHead> {
    let sth = lock(tree_signer)?.update_tree()?;

    log_store.store_tree_head(&sth)?;
    consistent_store.set_cluster_node_state(&ClusterNodeState {
        node_id: node_id.to_string(),
        newest_sth: Some(sth.clone()),
    })?;
    Ok(sth)
}

/// Decide whether the job keeps running after a tick
///
/// Errors that a later round cannot fix are handed back; recoverable ones
/// are logged and swallowed.
pub fn settle<T>(task: &'static str, result: SignerResult<T>) -> SignerResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if !e.is_recoverable() => {
            tracing::error!(
                task,
                error = %e,
                code = e.error_code(),
                fatal = e.is_fatal(),
                "Unrecoverable error, stopping signer job"
            );
            Err(e)
        }
        Err(e) => {
            tracing::warn!(task, error = %e, code = e.error_code(), "Round failed, retrying next tick");
            Ok(None)
        }
    }
}

fn lock<E: Loggable>(tree_signer: &Mutex<TreeSigner<E>>) -> SignerResult<MutexGuard<'_, TreeSigner<E>>> {
    tree_signer.lock().map_err(|_| {
        SignerError::Fatal(FatalError::Inconsistency(
            "tree signer lock poisoned by a panicked round".into(),
        ))
    })
}
