//! # Scheduler
//!
//! Decides when check cycles happen and fans clusters out to the worker pool.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start──▶ Running ──stop──▶ Stopping ──(workers joined)──▶ Idle
//! ```
//!
//! Both transitions are no-ops from the wrong state; `start` is refused while a stop is still
//! waiting for the previous pool. `start` allocates the job queue, spawns
//! the worker pool under its own cancellation token, queues one immediate trigger and spawns
//! the dispatch loop. `stop` shuts things down in a fixed order:
//!
//! 1. cancel the dispatch loop's token and wait for the loop to exit
//! 2. close the job queue so no further jobs can be written
//! 3. give workers the grace period to drain what is already queued
//! 4. cancel the worker token and wait for every worker
//!
//! ## Triggers
//!
//! `trigger_check` never blocks: when the trigger queue is full it fails with
//! [`SchedulerError::AlreadyWaiting`], so a burst of triggers collapses into a bounded number
//! of pending cycles. `trigger_for` bypasses the fan-out and pushes one cluster onto the job
//! queue, waiting for space if the queue is full.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::channels::{ChannelFactory, CycleTrigger, JobSender, TriggerReceiver, TriggerSender};
use super::worker_pool::{WorkerContext, WorkerPool};
use crate::config::MonitorConfig;
use crate::error::SchedulerError;
use crate::logging::log_cycle_operation;
use crate::models::ClusterSnapshot;

/// Longest period a ticker is armed with; anything larger is clamped
pub const MAX_TICK_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Interval whose first tick is one period from now, skipping missed ticks
pub(crate) fn periodic_ticker(period: Duration) -> Interval {
    let period = if period > MAX_TICK_PERIOD {
        warn!(
            requested_seconds = period.as_secs(),
            max_seconds = MAX_TICK_PERIOD.as_secs(),
            "Tick period too large, clamping"
        );
        MAX_TICK_PERIOD
    } else {
        period
    };

    let now = tokio::time::Instant::now();
    let first = now.checked_add(period).unwrap_or(now);
    let mut ticker = tokio::time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

enum SchedulerState {
    Idle,
    Running(RunningScheduler),
    /// `stop` owns the previous pool and is waiting for it
    Stopping,
}

struct RunningScheduler {
    scheduler_token: CancellationToken,
    trigger_tx: TriggerSender,
    job_tx: JobSender,
    dispatch: JoinHandle<()>,
    pool: WorkerPool,
}

pub struct Scheduler {
    context: WorkerContext,
    config: MonitorConfig,
    state: Mutex<SchedulerState>,
    live_workers: Arc<AtomicUsize>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("workers", &self.config.workers)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(context: WorkerContext, config: MonitorConfig) -> Self {
        Self {
            context,
            config,
            state: Mutex::new(SchedulerState::Idle),
            live_workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), SchedulerState::Running(_))
    }

    /// Worker tasks that have not exited yet, including those of a pool being stopped
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Start the dispatch loop and worker pool. Returns `false` if already running or if a
    /// stop is still in progress.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, frequency: Duration) -> bool {
        let mut state = self.state.lock();
        match *state {
            SchedulerState::Idle => {}
            SchedulerState::Running(_) => {
                debug!("Scheduler already running, ignoring start");
                return false;
            }
            SchedulerState::Stopping => {
                warn!("Scheduler is still stopping, ignoring start");
                return false;
            }
        }

        let frequency = if frequency.is_zero() {
            warn!(
                fallback_seconds = self.config.check_frequency_seconds,
                "Zero check frequency requested, using configured frequency"
            );
            self.config.check_frequency()
        } else {
            frequency
        };

        info!(
            frequency_seconds = frequency.as_secs(),
            workers = self.config.workers,
            job_queue_capacity = self.config.job_queue_capacity(),
            "Starting status monitor"
        );

        let (job_tx, job_rx) = ChannelFactory::job_channel(self.config.job_queue_capacity());
        let (trigger_tx, trigger_rx) =
            ChannelFactory::trigger_channel(self.config.trigger_queue_capacity);

        let pool = WorkerPool::spawn(
            self.config.workers,
            job_rx,
            self.context.clone(),
            CancellationToken::new(),
            Arc::clone(&self.live_workers),
        );

        let scheduler_token = CancellationToken::new();
        if let Err(e) = trigger_tx.try_send(CycleTrigger::Initial) {
            warn!(error = %e, "Could not queue initial trigger");
        }

        let dispatcher = Dispatcher {
            context: self.context.clone(),
            job_tx: job_tx.clone(),
            token: scheduler_token.clone(),
            active_only: self.config.active_clusters_only,
        };
        let dispatch = tokio::spawn(dispatcher.run(trigger_rx, frequency));

        *state = SchedulerState::Running(RunningScheduler {
            scheduler_token,
            trigger_tx,
            job_tx,
            dispatch,
            pool,
        });
        true
    }

    /// Stop dispatching and shut the worker pool down. Returns `false` if not running.
    pub async fn stop(&self) -> bool {
        let running = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, SchedulerState::Stopping) {
                SchedulerState::Running(running) => running,
                other => {
                    *state = other;
                    debug!("Scheduler not running, ignoring stop");
                    return false;
                }
            }
        };
        let _idle = IdleOnDrop(&self.state);
        let RunningScheduler {
            scheduler_token,
            trigger_tx,
            job_tx,
            dispatch,
            pool,
        } = running;

        info!("Stopping status monitor");

        scheduler_token.cancel();
        if let Err(e) = dispatch.await {
            error!(error = %e, "Dispatch loop ended abnormally");
        }

        // Closing the queue tells workers to drain and exit
        drop(trigger_tx);
        drop(job_tx);

        pool.shutdown(self.config.shutdown_grace_period()).await;
        info!("Status monitor stopped");
        true
    }

    /// Request a full cycle without waiting
    pub fn trigger_check(&self) -> Result<(), SchedulerError> {
        let state = self.state.lock();
        let SchedulerState::Running(running) = &*state else {
            return Err(SchedulerError::NotRunning);
        };

        match running.trigger_tx.try_send(CycleTrigger::Manual) {
            Ok(()) => {
                debug!(pending = running.trigger_tx.pending(), "Cycle trigger queued");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.context.stats.record_trigger_rejected();
                Err(SchedulerError::AlreadyWaiting {
                    capacity: running.trigger_tx.max_capacity(),
                })
            }
            Err(TrySendError::Closed(_)) => Err(SchedulerError::NotRunning),
        }
    }

    /// Queue a single cluster directly for the workers, waiting for queue space
    pub async fn trigger_for(&self, cluster: ClusterSnapshot) -> Result<(), SchedulerError> {
        let (job_tx, token) = {
            let state = self.state.lock();
            let SchedulerState::Running(running) = &*state else {
                return Err(SchedulerError::NotRunning);
            };
            (running.job_tx.clone(), running.scheduler_token.clone())
        };

        let uuid = cluster.uuid.clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(SchedulerError::NotRunning),
            sent = job_tx.send(Arc::new(cluster)) => {
                sent.map_err(|_| SchedulerError::QueueClosed)?;
                self.context.stats.record_job_dispatched();
                debug!(cluster = %uuid, "Queued single cluster check");
                Ok(())
            }
        }
    }
}

/// Returns the scheduler to idle once `stop` finishes or is dropped
struct IdleOnDrop<'a>(&'a Mutex<SchedulerState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.lock() = SchedulerState::Idle;
    }
}

/// The dispatch loop's state, owned by its task
struct Dispatcher {
    context: WorkerContext,
    job_tx: JobSender,
    token: CancellationToken,
    active_only: bool,
}

impl Dispatcher {
    async fn run(self, mut triggers: TriggerReceiver, frequency: Duration) {
        let mut ticker = periodic_ticker(frequency);

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    debug!("Dispatch loop cancelled");
                    break;
                }
                trigger = triggers.recv() => {
                    match trigger {
                        Some(trigger) => self.distribute_workload(trigger.as_str()).await,
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    self.distribute_workload("timer").await;
                }
            }
        }
    }

    /// List clusters, reset progress and push one job per cluster
    async fn distribute_workload(&self, source: &str) {
        let ctx = &self.context;
        let started = Instant::now();
        ctx.stats.record_cycle_started();
        debug!(source = source, "Check cycle tick");

        let clusters = match ctx.store.get_clusters(self.active_only).await {
            Ok(clusters) => clusters,
            Err(e) => {
                error!(source = source, error = %e, "Could not get clusters, abandoning cycle");
                ctx.stats.record_cycle_abandoned();
                log_cycle_operation("distribute", 0, "abandoned", Some(&e.to_string()));
                return;
            }
        };

        let total = clusters.len();
        ctx.progress.start_checking(&clusters);
        let dispatched = self.push_jobs(clusters).await;
        ctx.progress.finish_checking();

        if dispatched < total {
            ctx.stats.record_cycle_abandoned();
            log_cycle_operation(
                "distribute",
                dispatched,
                "interrupted",
                Some(&format!("{dispatched} of {total} clusters queued")),
            );
            return;
        }

        log_cycle_operation(
            "distribute",
            total,
            "completed",
            Some(&format!("{} ms", started.elapsed().as_millis())),
        );
    }

    /// Returns the number of jobs queued before cancellation or queue closure
    async fn push_jobs(&self, clusters: Vec<ClusterSnapshot>) -> usize {
        let mut dispatched = 0;

        for cluster in clusters {
            if self.token.is_cancelled() {
                break;
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                sent = self.job_tx.send(Arc::new(cluster)) => {
                    if sent.is_err() {
                        warn!("Job queue closed during distribution");
                        break;
                    }
                    dispatched += 1;
                    self.context.stats.record_job_dispatched();
                }
            }
        }

        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckerResult, CheckerSearch, CheckerStatus, WrappedCheckerResult};
    use crate::orchestration::progress::ProgressTracker;
    use crate::orchestration::stats::MonitorStats;
    use crate::registry::{checker_fn, Checker, CheckerOutput, CheckerRegistry};
    use crate::store::{InMemoryStore, Store};
    use async_trait::async_trait;

    /// Ignores cancellation so a stopping pool has to wait for it
    struct StubbornChecker {
        delay: Duration,
    }

    #[async_trait]
    impl Checker for StubbornChecker {
        async fn check(&self, cluster: &ClusterSnapshot, _cancel: &CancellationToken) -> CheckerOutput {
            tokio::time::sleep(self.delay).await;
            Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
                cluster.uuid.clone(),
                CheckerResult::new("stubborn", CheckerStatus::Good),
            ))])
        }
    }

    fn scheduler_with(store: Arc<InMemoryStore>, registry: CheckerRegistry) -> Scheduler {
        let context = WorkerContext {
            store,
            registry: Arc::new(registry),
            progress: Arc::new(ProgressTracker::new()),
            stats: Arc::new(MonitorStats::new()),
        };
        let config = MonitorConfig {
            workers: 2,
            shutdown_grace_period_ms: 1_000,
            ..Default::default()
        };
        Scheduler::new(context, config)
    }

    fn scheduler(store: Arc<InMemoryStore>) -> Scheduler {
        let registry = CheckerRegistry::builder()
            .register(
                "clusterName",
                checker_fn(|cluster| {
                    Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
                        cluster.uuid.clone(),
                        CheckerResult::new("clusterName", CheckerStatus::Good),
                    ))])
                }),
            )
            .unwrap()
            .build();
        scheduler_with(store, registry)
    }

    async fn wait_for_results(store: &InMemoryStore, expected: usize) {
        for _ in 0..200 {
            let results = store
                .get_checker_results(&CheckerSearch::default())
                .await
                .unwrap();
            if results.len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {expected} results");
    }

    #[tokio::test]
    async fn test_triggers_require_running_scheduler() {
        let scheduler = scheduler(Arc::new(InMemoryStore::new()));

        assert_eq!(scheduler.trigger_check(), Err(SchedulerError::NotRunning));
        assert_eq!(
            scheduler
                .trigger_for(ClusterSnapshot::new("c-1", "prod"))
                .await,
            Err(SchedulerError::NotRunning)
        );
        assert!(!scheduler.stop().await);
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_runs_initial_cycle() {
        let store = Arc::new(InMemoryStore::with_clusters([
            ClusterSnapshot::new("c-1", "prod"),
            ClusterSnapshot::new("c-2", "staging"),
        ]));
        let scheduler = scheduler(Arc::clone(&store));

        assert!(scheduler.start(Duration::from_secs(3600)));
        assert!(!scheduler.start(Duration::from_secs(3600)));
        assert!(scheduler.is_running());

        wait_for_results(&store, 2).await;

        assert!(scheduler.stop().await);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.live_workers(), 0);
    }

    #[tokio::test]
    async fn test_trigger_for_checks_single_cluster() {
        let store = Arc::new(InMemoryStore::new());
        let scheduler = scheduler(Arc::clone(&store));
        scheduler.start(Duration::from_secs(3600));

        scheduler
            .trigger_for(ClusterSnapshot::new("c-new", "fresh"))
            .await
            .unwrap();
        wait_for_results(&store, 1).await;

        let results = store
            .get_checker_results(&CheckerSearch::for_cluster("c-new"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_listing_failure_abandons_cycle() {
        let store = Arc::new(InMemoryStore::with_clusters([ClusterSnapshot::new(
            "c-1", "prod",
        )]));
        store.set_unavailable(true);
        let scheduler = scheduler(Arc::clone(&store));
        let stats = Arc::clone(&scheduler.context.stats);

        scheduler.start(Duration::from_secs(3600));
        for _ in 0..200 {
            if stats.snapshot().cycles_abandoned > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stats.snapshot().cycles_abandoned, 1);
        assert_eq!(stats.snapshot().jobs_dispatched, 0);

        // the engine keeps running after the failure
        assert!(scheduler.is_running());
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_huge_frequency_still_runs_initial_cycle() {
        let store = Arc::new(InMemoryStore::with_clusters([ClusterSnapshot::new(
            "c-1", "prod",
        )]));
        let scheduler = scheduler(Arc::clone(&store));

        assert!(scheduler.start(Duration::MAX));
        wait_for_results(&store, 1).await;

        assert!(scheduler.stop().await);
        assert_eq!(scheduler.live_workers(), 0);
    }

    #[tokio::test]
    async fn test_ticker_period_is_clamped() {
        let ticker = periodic_ticker(Duration::MAX);
        assert_eq!(ticker.period(), MAX_TICK_PERIOD);

        let ticker = periodic_ticker(Duration::from_secs(30));
        assert_eq!(ticker.period(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_start_refused_until_stop_finishes() {
        let store = Arc::new(InMemoryStore::with_clusters([ClusterSnapshot::new(
            "c-1", "prod",
        )]));
        let registry = CheckerRegistry::builder()
            .register(
                "stubborn",
                StubbornChecker {
                    delay: Duration::from_millis(400),
                },
            )
            .unwrap()
            .build();
        let scheduler = scheduler_with(Arc::clone(&store), registry);
        assert!(scheduler.start(Duration::from_secs(3600)));

        // let a worker pick up the job
        for _ in 0..100 {
            if scheduler.context.progress.get_progress_for("c-1").is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        let stop = scheduler.stop();
        tokio::pin!(stop);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), &mut stop)
                .await
                .is_err(),
            "stop should still be waiting on the in-flight checker"
        );

        assert!(!scheduler.is_running());
        assert!(!scheduler.start(Duration::from_secs(3600)));
        assert_eq!(scheduler.trigger_check(), Err(SchedulerError::NotRunning));

        assert!(stop.await);
        assert_eq!(scheduler.live_workers(), 0);
        assert_eq!(store.result_writes(), 1);

        assert!(scheduler.start(Duration::from_secs(3600)));
        assert!(scheduler.stop().await);
    }
}
