//! # Janitor
//!
//! Periodic stale-data cleanup, independent of the check cycle. A shift:
//!
//! - deletes expired dismissals
//! - deletes results of log-type checkers older than the configured maximum age
//! - for every active cluster, deletes results and dismissals that reference nodes or
//!   buckets no longer present in the cluster snapshot
//!
//! Each step logs its failure and the shift carries on with the next one.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::channels::{ChannelFactory, CycleTrigger, TriggerReceiver, TriggerSender};
use super::scheduler::periodic_ticker;
use super::stats::MonitorStats;
use crate::config::JanitorConfig;
use crate::error::{SchedulerError, StoreError};
use crate::models::{CheckerSearch, ClusterSnapshot};
use crate::registry::{CheckerRegistry, CheckerType};
use crate::store::Store;

struct RunningJanitor {
    token: CancellationToken,
    shift_tx: TriggerSender,
    task: JoinHandle<()>,
}

pub struct Janitor {
    cleaner: Cleaner,
    config: JanitorConfig,
    running: Mutex<Option<RunningJanitor>>,
}

impl std::fmt::Debug for Janitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Janitor")
            .field("config", &self.config)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Janitor {
    pub fn new(
        store: Arc<dyn Store>,
        registry: Arc<CheckerRegistry>,
        stats: Arc<MonitorStats>,
        config: JanitorConfig,
    ) -> Self {
        Self {
            cleaner: Cleaner {
                store,
                registry,
                stats,
                log_alert_max_age: config.log_alert_max_age(),
            },
            config,
            running: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Start periodic shifts. Returns `false` if already running.
    pub fn start(&self, frequency: Duration) -> bool {
        let mut running = self.running.lock();
        if running.is_some() {
            return false;
        }

        let frequency = if frequency.is_zero() {
            self.config.frequency()
        } else {
            frequency
        };
        info!(frequency_seconds = frequency.as_secs(), "🧹 JANITOR: Starting");

        let token = CancellationToken::new();
        let (shift_tx, shift_rx) = ChannelFactory::trigger_channel(self.config.trigger_queue_capacity);
        let task = tokio::spawn(self.cleaner.clone().run(shift_rx, token.clone(), frequency));

        *running = Some(RunningJanitor {
            token,
            shift_tx,
            task,
        });
        true
    }

    /// Stop periodic shifts, waiting for an in-flight shift to finish. Returns `false` if not
    /// running.
    pub async fn stop(&self) -> bool {
        let running = self.running.lock().take();
        let Some(running) = running else {
            return false;
        };

        running.token.cancel();
        if let Err(e) = running.task.await {
            error!(error = %e, "🧹 JANITOR: Task ended abnormally");
        }
        info!("🧹 JANITOR: Stopped");
        true
    }

    /// Request a shift now without waiting for the timer
    pub fn force_shift(&self) -> Result<(), SchedulerError> {
        let running = self.running.lock();
        let running = running.as_ref().ok_or(SchedulerError::NotRunning)?;

        running
            .shift_tx
            .try_send(CycleTrigger::Manual)
            .map_err(|e| match e {
                TrySendError::Full(_) => SchedulerError::AlreadyWaiting {
                    capacity: running.shift_tx.max_capacity(),
                },
                TrySendError::Closed(_) => SchedulerError::NotRunning,
            })
    }

    /// Run one shift inline, returning the number of removed records
    pub async fn run_shift(&self) -> u64 {
        self.cleaner.shift().await
    }
}

#[derive(Clone)]
struct Cleaner {
    store: Arc<dyn Store>,
    registry: Arc<CheckerRegistry>,
    stats: Arc<MonitorStats>,
    log_alert_max_age: Duration,
}

impl Cleaner {
    async fn run(self, mut shifts: TriggerReceiver, token: CancellationToken, frequency: Duration) {
        let mut ticker = periodic_ticker(frequency);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                shift = shifts.recv() => {
                    if shift.is_none() {
                        break;
                    }
                    self.shift().await;
                }
                _ = ticker.tick() => {
                    self.shift().await;
                }
            }
        }
        debug!("🧹 JANITOR: Loop exited");
    }

    async fn shift(&self) -> u64 {
        info!("🧹 JANITOR: Shift started");
        let started = Instant::now();
        let mut removed = 0;

        removed += report(
            "expired dismissals",
            self.store.delete_expired_dismissals(Utc::now()).await,
        );
        removed += self.clean_old_log_alerts().await;

        match self.store.get_clusters(true).await {
            Ok(clusters) => {
                for cluster in &clusters {
                    removed += self.clean_cluster(cluster).await;
                }
            }
            Err(e) => error!(error = %e, "🧹 JANITOR: Could not get clusters"),
        }

        self.stats.record_janitor_shift(removed);
        debug!(
            removed = removed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "🧹 JANITOR: Shift ended"
        );
        removed
    }

    /// Remove data for nodes and buckets that are no longer part of the cluster
    async fn clean_cluster(&self, cluster: &ClusterSnapshot) -> u64 {
        let nodes = cluster.node_uuids();
        let buckets = cluster.bucket_names();
        let uuid = cluster.uuid.as_str();

        report(
            "unknown node results",
            self.store.delete_results_for_unknown_nodes(uuid, &nodes).await,
        ) + report(
            "unknown bucket results",
            self.store.delete_results_for_unknown_buckets(uuid, &buckets).await,
        ) + report(
            "unknown node dismissals",
            self.store.delete_dismissals_for_unknown_nodes(uuid, &nodes).await,
        ) + report(
            "unknown bucket dismissals",
            self.store
                .delete_dismissals_for_unknown_buckets(uuid, &buckets)
                .await,
        )
    }

    async fn clean_old_log_alerts(&self) -> u64 {
        let Ok(max_age) = chrono::Duration::from_std(self.log_alert_max_age) else {
            return 0;
        };
        let cutoff = Utc::now() - max_age;
        let mut removed = 0;

        let log_checkers = self
            .registry
            .definitions()
            .into_iter()
            .filter(|d| d.checker_type == CheckerType::Log);

        for definition in log_checkers {
            let search = CheckerSearch::default().with_name(definition.name.clone());
            let results = match self.store.get_checker_results(&search).await {
                Ok(results) => results,
                Err(e) => {
                    error!(checker = %definition.name, error = %e, "🧹 JANITOR: Could not find log alerts");
                    continue;
                }
            };

            let stale_clusters: BTreeSet<String> = results
                .into_iter()
                .filter(|r| r.result.time < cutoff)
                .map(|r| r.cluster)
                .collect();

            for cluster in stale_clusters {
                let scoped = CheckerSearch {
                    cluster: Some(cluster),
                    ..search.clone()
                };
                removed += report(
                    "old log alerts",
                    self.store.delete_checker_results(&scoped).await,
                );
            }
        }

        removed
    }
}

fn report(cleaning: &str, outcome: Result<u64, StoreError>) -> u64 {
    match outcome {
        Ok(removed) => {
            debug!(count = removed, "🧹 JANITOR: Removed {cleaning}");
            removed
        }
        Err(e) => {
            error!(error = %e, "🧹 JANITOR: Could not remove {cleaning}");
            0
        }
    }
}
