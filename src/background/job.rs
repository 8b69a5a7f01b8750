//! Signer job task

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use super::config::JobConfig;
use super::logic;
use crate::error::{FatalError, SignerResult};
use crate::sequencer::TreeSigner;
use crate::traits::{ConsistentStore, LogStore, Loggable};

/// Background job driving one node's tree signer
///
/// Sequencing and signing never overlap: both go through the same lock, and
/// the loop waits for each round before taking the next tick.
pub struct SignerJob<E: Loggable> {
    tree_signer: Arc<Mutex<TreeSigner<E>>>,
    log_store: Arc<dyn LogStore<E>>,
    consistent_store: Arc<dyn ConsistentStore<E>>,
    node_id: String,
    config: JobConfig,
}

impl<E: Loggable> SignerJob<E> {
    pub fn new(
        tree_signer: TreeSigner<E>,
        log_store: Arc<dyn LogStore<E>>,
        consistent_store: Arc<dyn ConsistentStore<E>>,
        node_id: impl Into<String>,
        config: JobConfig,
    ) -> Self {
        Self {
            tree_signer: Arc::new(Mutex::new(tree_signer)),
            log_store,
            consistent_store,
            node_id: node_id.into(),
            config: config.normalized(),
        }
    }

    /// Shared handle to the signer, e.g. for [`TreeSigner::append`]
    pub fn tree_signer(&self) -> Arc<Mutex<TreeSigner<E>>> {
        Arc::clone(&self.tree_signer)
    }

    /// Run until shutdown is signalled or an unrecoverable error occurs
    ///
    /// # Errors
    /// The unrecoverable [`crate::SignerError`] that stopped the job
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> SignerResult<()> {
        let mut sequencing = interval(Duration::from_millis(self.config.sequencing_interval_ms));
        let mut signing = interval(Duration::from_millis(self.config.signing_interval_ms));
        sequencing.set_missed_tick_behavior(MissedTickBehavior::Delay);
        signing.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            node_id = %self.node_id,
            sequencing_interval_ms = self.config.sequencing_interval_ms,
            signing_interval_ms = self.config.signing_interval_ms,
            "Signer job started"
        );

        loop {
            tokio::select! {
                _ = sequencing.tick() => {
                    let tree_signer = Arc::clone(&self.tree_signer);
                    let result = run_blocking(move || logic::run_sequencing(&tree_signer)).await;
                    logic::settle("sequencing", result)?;
                }
                _ = signing.tick() => {
                    let tree_signer = Arc::clone(&self.tree_signer);
                    let log_store = Arc::clone(&self.log_store);
                    let consistent_store = Arc::clone(&self.consistent_store);
                    let node_id = self.node_id.clone();
                    let result = run_blocking(move || {
                        logic::run_signing(
                            &tree_signer,
                            log_store.as_ref(),
                            consistent_store.as_ref(),
                            &node_id,
                        )
                    })
                    .await;
                    logic::settle("signing", result)?;
                }
                _ = shutdown.recv() => {
                    tracing::info!(node_id = %self.node_id, "Signer job shutting down");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Run a round on the blocking pool; a panicked round is fatal
async fn run_blocking<T, F>(f: F) -> SignerResult<T>
where
    F: FnOnce() -> SignerResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(FatalError::Inconsistency(format!("round task failed: {}", e)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::config::DEFAULT_SIGNING_INTERVAL_MS;
    use crate::clock::ManualClock;
    use crate::coordination::MemoryConsistentStore;
    use crate::error::SigningError;
    use crate::sequencer::SequencerConfig;
    use crate::signer::Ed25519TreeHeadSigner;
    use crate::storage::MemoryLogStore;
    use crate::traits::{LoggedEntry, TreeHeadSigner};
    use crate::tree_head::SignedTreeHead;

    struct BrokenSigner;

    impl TreeHeadSigner for BrokenSigner {
        fn sign_tree_head(&self, _sth: &SignedTreeHead) -> Result<Vec<u8>, SigningError> {
            Err(SigningError("hsm offline".into()))
        }
    }

    fn fast_config() -> JobConfig {
        JobConfig {
            sequencing_interval_ms: 10,
            signing_interval_ms: 20,
        }
    }

    fn job_with_signer(
        signer: Arc<dyn TreeHeadSigner>,
    ) -> (
        SignerJob<LoggedEntry>,
        Arc<MemoryLogStore<LoggedEntry>>,
        Arc<MemoryConsistentStore<LoggedEntry>>,
    ) {
        job_with_config(signer, fast_config())
    }

    fn job_with_config(
        signer: Arc<dyn TreeHeadSigner>,
        config: JobConfig,
    ) -> (
        SignerJob<LoggedEntry>,
        Arc<MemoryLogStore<LoggedEntry>>,
        Arc<MemoryConsistentStore<LoggedEntry>>,
    ) {
        let log_store = Arc::new(MemoryLogStore::new());
        let consistent = Arc::new(MemoryConsistentStore::new("node-a"));
        let tree_signer = TreeSigner::new(
            SequencerConfig::with_guard_window_ms(0),
            log_store.clone(),
            consistent.clone(),
            signer,
            Arc::new(ManualClock::new(50_000)),
        )
        .unwrap();
        let job = SignerJob::new(
            tree_signer,
            log_store.clone(),
            consistent.clone(),
            "node-a",
            config,
        );
        (job, log_store, consistent)
    }

    #[tokio::test]
    async fn test_job_sequences_and_publishes_until_shutdown() {
        let (job, log_store, consistent) =
            job_with_signer(Arc::new(Ed25519TreeHeadSigner::from_bytes(&[5; 32])));
        for i in 0..3u64 {
            consistent
                .add_pending_entry(LoggedEntry::new(format!("e{}", i).into_bytes(), i))
                .unwrap();
        }
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move { job.run(shutdown_rx).await });
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(log_store.current_committed_size().unwrap(), 3);
        let published = consistent.cluster_node_state().unwrap().unwrap();
        let head = published.newest_sth.unwrap();
        assert_eq!(head.tree_size, 3);
        assert!(log_store.tree_head_count() >= 1);
    }

    #[tokio::test]
    async fn test_zero_intervals_do_not_panic() {
        let zero = JobConfig {
            sequencing_interval_ms: 0,
            signing_interval_ms: 0,
        };
        let (job, _log_store, _consistent) =
            job_with_config(Arc::new(Ed25519TreeHeadSigner::from_bytes(&[5; 32])), zero);
        assert_eq!(job.config.signing_interval_ms, DEFAULT_SIGNING_INTERVAL_MS);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move { job.run(shutdown_rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_job_stops_on_fatal_error() {
        let (job, log_store, _consistent) = job_with_signer(Arc::new(BrokenSigner));
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let result = tokio::time::timeout(Duration::from_secs(5), job.run(shutdown_rx))
            .await
            .unwrap();

        let err = result.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.error_code(), "SIGNING_FAILED");
        assert_eq!(log_store.tree_head_count(), 0);
    }
}
