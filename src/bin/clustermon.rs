//! # Clustermon Service
//!
//! Runs the status monitor against an in-memory store seeded with demonstration clusters and
//! two built-in checkers, until Ctrl+C or SIGTERM.
//!
//! ## Usage
//!
//! ```bash
//! # Defaults, then ./clustermon.toml if present, then CLUSTERMON_* overrides
//! cargo run --bin clustermon
//!
//! # Explicit configuration file
//! CLUSTERMON_CONFIG_FILE=/etc/clustermon.toml cargo run --bin clustermon
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use clustermon_core::config::ConfigManager;
use clustermon_core::logging;
use clustermon_core::models::{
    BucketSummary, CheckerResult, CheckerStatus, ClusterSnapshot, NodeSummary,
    WrappedCheckerResult,
};
use clustermon_core::orchestration::StatusMonitor;
use clustermon_core::registry::{checker_fn, CheckerDefinition, CheckerRegistry};
use clustermon_core::store::InMemoryStore;

const MAX_BUCKETS: usize = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_structured_logging();

    info!("🚀 Starting Clustermon...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));

    let config_file = env::var("CLUSTERMON_CONFIG_FILE").ok().map(PathBuf::from);
    let manager = ConfigManager::load_from(config_file).context("failed to load configuration")?;
    let config = manager.config().clone();

    let store = Arc::new(InMemoryStore::with_clusters(demo_clusters()));
    let monitor = StatusMonitor::new(store, demo_registry()?, config.clone())
        .await
        .context("failed to initialize status monitor")?;

    monitor.start(config.check_frequency());
    info!(
        checkers = monitor.checker_definitions().len(),
        "🎉 Clustermon started, press Ctrl+C to shut down"
    );

    shutdown_signal().await;

    info!("🛑 Shutdown signal received, stopping monitor...");
    monitor.stop().await;

    let stats = monitor.stats();
    info!(
        cycles = stats.cycles_started,
        checkers_run = stats.checkers_run,
        results_stored = stats.results_stored,
        "👋 Clustermon shutdown complete"
    );
    Ok(())
}

fn demo_clusters() -> Vec<ClusterSnapshot> {
    vec![
        ClusterSnapshot::new("c0ffee00-0000-4000-8000-000000000001", "production")
            .with_nodes(vec![
                NodeSummary::new("node-a"),
                NodeSummary::new("node-b"),
                NodeSummary::new("node-c"),
            ])
            .with_buckets(vec![BucketSummary::new("orders"), BucketSummary::new("users")]),
        ClusterSnapshot::new("c0ffee00-0000-4000-8000-000000000002", "staging")
            .with_nodes(vec![NodeSummary::new("node-x")])
            .with_buckets(vec![BucketSummary::new("scratch")]),
    ]
}

fn demo_registry() -> anyhow::Result<CheckerRegistry> {
    let registry = CheckerRegistry::builder()
        .register_definition(
            CheckerDefinition::new("singleOrTwoNodeCluster")
                .with_title("One or two node cluster")
                .with_description("Clusters with fewer than three nodes cannot fail over safely."),
            checker_fn(|cluster| {
                let result = if cluster.nodes.len() > 2 {
                    CheckerResult::new("singleOrTwoNodeCluster", CheckerStatus::Good)
                } else {
                    CheckerResult::new("singleOrTwoNodeCluster", CheckerStatus::Warn)
                        .with_remediation("Add nodes so the cluster has at least three.")
                };
                Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
                    cluster.uuid.clone(),
                    result.with_value(serde_json::json!({ "nodes": cluster.nodes.len() })),
                ))])
            }),
        )?
        .register_definition(
            CheckerDefinition::new("maxBuckets")
                .with_title("Number of buckets")
                .with_description("More than 30 buckets can impact performance."),
            checker_fn(|cluster| {
                let status = if cluster.buckets.len() > MAX_BUCKETS {
                    CheckerStatus::Alert
                } else {
                    CheckerStatus::Good
                };
                Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
                    cluster.uuid.clone(),
                    CheckerResult::new("maxBuckets", status)
                        .with_value(serde_json::json!({ "buckets": cluster.buckets.len() })),
                ))])
            }),
        )?
        .build();
    Ok(registry)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
