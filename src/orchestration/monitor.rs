//! # Status Monitor
//!
//! Public entry point of the engine. Wires the store, the checker registry, the progress
//! tracker, the scheduler with its worker pool, and the janitor together, and serves the read
//! path used by API handlers.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use clustermon_core::config::MonitorConfig;
//! use clustermon_core::models::CheckerSearch;
//! use clustermon_core::orchestration::StatusMonitor;
//! use clustermon_core::registry::CheckerRegistry;
//! use clustermon_core::store::InMemoryStore;
//!
//! # async fn example() -> clustermon_core::Result<()> {
//! let monitor = StatusMonitor::new(
//!     Arc::new(InMemoryStore::new()),
//!     CheckerRegistry::empty(),
//!     MonitorConfig::default(),
//! )
//! .await?;
//!
//! monitor.start(Duration::from_secs(300));
//! monitor.trigger_check()?;
//!
//! let visible = monitor
//!     .get_checker_results(&CheckerSearch::for_cluster("c-1"), true)
//!     .await?;
//! println!("{} results, {} dismissed", visible.results.len(), visible.dismissed);
//!
//! monitor.stop().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::dismissal_filter::{apply_dismissals, FilteredResults};
use super::janitor::Janitor;
use super::progress::ProgressTracker;
use super::scheduler::Scheduler;
use super::stats::{MonitorStats, MonitorStatsSnapshot};
use super::worker_pool::WorkerContext;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::models::{CheckerSearch, ClusterProgress, ClusterSnapshot, ClusterStatusSummary};
use crate::registry::{CheckerDefinition, CheckerRegistry};
use crate::store::Store;

pub struct StatusMonitor {
    store: Arc<dyn Store>,
    registry: Arc<CheckerRegistry>,
    progress: Arc<ProgressTracker>,
    stats: Arc<MonitorStats>,
    scheduler: Scheduler,
    janitor: Janitor,
    config: MonitorConfig,
}

impl std::fmt::Debug for StatusMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusMonitor")
            .field("checkers", &self.registry.names())
            .field("scheduler", &self.scheduler)
            .field("janitor", &self.janitor)
            .finish_non_exhaustive()
    }
}

impl StatusMonitor {
    /// Build the engine, probing the store first
    ///
    /// An invalid configuration or an unreachable store ends construction; nothing is spawned
    /// until [`StatusMonitor::start`].
    pub async fn new(
        store: Arc<dyn Store>,
        registry: CheckerRegistry,
        config: MonitorConfig,
    ) -> Result<Self> {
        config.validate()?;

        if !store.is_initialized().await? {
            return Err(MonitorError::Initialization(
                "store is not initialized".to_string(),
            ));
        }

        let registry = Arc::new(registry);
        let progress = Arc::new(ProgressTracker::new());
        let stats = Arc::new(MonitorStats::new());

        let context = WorkerContext {
            store: Arc::clone(&store),
            registry: Arc::clone(&registry),
            progress: Arc::clone(&progress),
            stats: Arc::clone(&stats),
        };
        let scheduler = Scheduler::new(context, config.clone());
        let janitor = Janitor::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&stats),
            config.janitor.clone(),
        );

        info!(
            checkers = registry.len(),
            workers = config.workers,
            janitor_enabled = config.janitor.enabled,
            "Status monitor initialized"
        );

        Ok(Self {
            store,
            registry,
            progress,
            stats,
            scheduler,
            janitor,
            config,
        })
    }

    /// Start checking every `frequency`; a no-op returning `false` when already running
    pub fn start(&self, frequency: Duration) -> bool {
        let started = self.scheduler.start(frequency);
        if started && self.config.janitor.enabled {
            self.janitor.start(self.config.janitor.frequency());
        }
        started
    }

    /// Ordered shutdown; a no-op returning `false` when not running
    pub async fn stop(&self) -> bool {
        let stopped = self.scheduler.stop().await;
        self.janitor.stop().await;
        stopped
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Worker tasks still alive; zero once `stop` has returned
    pub fn live_workers(&self) -> usize {
        self.scheduler.live_workers()
    }

    /// Request a full cycle without blocking
    pub fn trigger_check(&self) -> Result<()> {
        Ok(self.scheduler.trigger_check()?)
    }

    /// Check one cluster as soon as a worker is free, waiting if the job queue is full
    pub async fn trigger_for(&self, cluster: ClusterSnapshot) -> Result<()> {
        Ok(self.scheduler.trigger_for(cluster).await?)
    }

    /// Request a janitor shift without blocking
    pub fn force_janitor_shift(&self) -> Result<()> {
        Ok(self.janitor.force_shift()?)
    }

    pub fn get_progress_for(&self, uuid: &str) -> Result<ClusterProgress> {
        Ok(self.progress.get_progress_for(uuid)?)
    }

    /// When the most recent cycle started distributing
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.progress.last_run()
    }

    /// Stored results matching `search`, optionally with dismissed results hidden
    pub async fn get_checker_results(
        &self,
        search: &CheckerSearch,
        filter_dismissed: bool,
    ) -> Result<FilteredResults> {
        let results = self.store.get_checker_results(search).await?;

        if !filter_dismissed {
            return Ok(FilteredResults {
                results,
                dismissed: 0,
            });
        }

        Ok(apply_dismissals(&*self.store, search.cluster.as_deref(), results).await)
    }

    /// Per-status counts for one cluster
    pub async fn get_status_summary(
        &self,
        cluster_uuid: &str,
        filter_dismissed: bool,
    ) -> Result<ClusterStatusSummary> {
        let filtered = self
            .get_checker_results(&CheckerSearch::for_cluster(cluster_uuid), filter_dismissed)
            .await?;

        if filtered.results.is_empty() && filtered.dismissed == 0 {
            warn!(cluster = %cluster_uuid, "No checker results stored for cluster");
        }

        Ok(ClusterStatusSummary::from_results(
            &filtered.results,
            filtered.dismissed,
        ))
    }

    pub fn checker_definitions(&self) -> Vec<&CheckerDefinition> {
        self.registry.definitions()
    }

    pub fn stats(&self) -> MonitorStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SchedulerError, StoreError};
    use crate::models::{CheckerResult, CheckerStatus, Dismissal, WrappedCheckerResult};
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_unavailable_store_fails_construction() {
        let store = Arc::new(InMemoryStore::new());
        store.set_unavailable(true);

        let result =
            StatusMonitor::new(store, CheckerRegistry::empty(), MonitorConfig::default()).await;
        assert!(matches!(
            result,
            Err(MonitorError::Store(StoreError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_fails_construction() {
        let config = MonitorConfig {
            workers: 0,
            ..Default::default()
        };
        let result =
            StatusMonitor::new(Arc::new(InMemoryStore::new()), CheckerRegistry::empty(), config)
                .await;
        assert!(matches!(result, Err(MonitorError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_read_path_summary_with_dismissals() {
        let store = Arc::new(InMemoryStore::new());
        for (checker, status) in [
            ("mixedMode", CheckerStatus::Warn),
            ("maxBuckets", CheckerStatus::Alert),
            ("clusterName", CheckerStatus::Good),
        ] {
            store
                .set_checker_result(&WrappedCheckerResult::cluster_scoped(
                    "c-1",
                    CheckerResult::new(checker, status),
                ))
                .await
                .unwrap();
        }
        store
            .add_dismissal(Dismissal::for_cluster("maxBuckets", "c-1"))
            .await
            .unwrap();

        let monitor = StatusMonitor::new(
            store,
            CheckerRegistry::empty(),
            MonitorConfig::default(),
        )
        .await
        .unwrap();

        let summary = monitor.get_status_summary("c-1", true).await.unwrap();
        assert_eq!(summary.good, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.alerts, 0);
        assert_eq!(summary.dismissed, 1);

        let unfiltered = monitor.get_status_summary("c-1", false).await.unwrap();
        assert_eq!(unfiltered.alerts, 1);
        assert_eq!(unfiltered.dismissed, 0);
    }

    #[tokio::test]
    async fn test_not_running_errors_surface() {
        let monitor = StatusMonitor::new(
            Arc::new(InMemoryStore::new()),
            CheckerRegistry::empty(),
            MonitorConfig::default(),
        )
        .await
        .unwrap();

        assert!(matches!(
            monitor.trigger_check(),
            Err(MonitorError::Scheduler(SchedulerError::NotRunning))
        ));
        assert!(matches!(
            monitor.get_progress_for("c-1"),
            Err(MonitorError::Progress(_))
        ));
        assert!(!monitor.stop().await);
    }
}
