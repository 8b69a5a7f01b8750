//! ct-tree-signer - sequencing and tree-head signing node

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ct_tree_signer::background::{JobConfig, SignerJob};
use ct_tree_signer::clock::SystemClock;
use ct_tree_signer::coordination::MemoryConsistentStore;
use ct_tree_signer::signer::Ed25519TreeHeadSigner;
use ct_tree_signer::storage::{SqliteConfig, SqliteLogStore};
use ct_tree_signer::{LogStore, LoggedEntry, SequencerConfig, TreeSigner};

#[derive(Parser, Debug)]
#[command(name = "ct-tree-signer")]
#[command(about = "Sequencing and tree-head signing node for an append-only log")]
struct Args {
    /// Path to SQLite database
    #[arg(long, env = "CT_DATABASE_PATH", default_value = "./ct-log.db")]
    database: String,

    /// Path to the 32-byte Ed25519 signing key seed
    #[arg(long, env = "CT_SIGNING_KEY_PATH")]
    signing_key: String,

    /// Identity this node publishes its tree heads under
    #[arg(long, env = "CT_NODE_ID", default_value = "node-0")]
    node_id: String,

    /// Log level
    #[arg(long, env = "CT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ct-tree-signer v{}", env!("CARGO_PKG_VERSION"));

    let signer = Ed25519TreeHeadSigner::from_file(&args.signing_key)
        .with_context(|| format!("loading signing key from {}", args.signing_key))?;
    tracing::info!(key_id = %hex::encode(signer.key_id()), "Signing key loaded");

    let log_store: Arc<dyn LogStore<LoggedEntry>> = Arc::new(
        SqliteLogStore::with_config(SqliteConfig {
            path: args.database.clone(),
            ..SqliteConfig::default()
        })
        .with_context(|| format!("opening log store at {}", args.database))?,
    );

    // Single-node cluster, seeded from the durable log below; a networked
    // store plugs in through the same trait.
    let consistent_store = Arc::new(MemoryConsistentStore::<LoggedEntry>::new(args.node_id.clone()));

    let sequencer_config = SequencerConfig::from_env();
    let job_config = JobConfig::from_env();
    tracing::info!(
        guard_window_ms = sequencer_config.guard_window_ms,
        sequencing_interval_ms = job_config.sequencing_interval_ms,
        signing_interval_ms = job_config.signing_interval_ms,
        "Configuration loaded"
    );

    let tree_signer = tokio::task::spawn_blocking({
        let log_store = Arc::clone(&log_store);
        let consistent_store = consistent_store.clone();
        move || {
            consistent_store.seed_from_log_store(log_store.as_ref())?;
            TreeSigner::new(
                sequencer_config,
                log_store,
                consistent_store,
                Arc::new(signer),
                Arc::new(SystemClock),
            )
        }
    })
    .await?
    .context("rebuilding tree from log store")?;
    tracing::info!(tree_size = tree_signer.leaf_count(), "Tree signer ready");

    let job = SignerJob::new(
        tree_signer,
        Arc::clone(&log_store),
        consistent_store,
        args.node_id.clone(),
        job_config,
    );
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mut handle = tokio::spawn(async move { job.run(shutdown_rx).await });

    // A fatal error may end the job before any signal arrives.
    let finished = tokio::select! {
        joined = &mut handle => Some(joined?),
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for shutdown signal")?;
            tracing::info!("Shutdown signal received");
            None
        }
    };
    let result = match finished {
        Some(result) => result,
        None => {
            let _ = shutdown_tx.send(());
            handle.await?
        }
    };
    result.context("signer job stopped")?;

    if let Some(sth) = log_store.latest_tree_head()? {
        tracing::info!(tree_head = %serde_json::to_string(&sth)?, "Latest stored tree head");
    }
    Ok(())
}
