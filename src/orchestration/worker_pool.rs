//! # Worker Pool
//!
//! A fixed set of tokio tasks draining the shared job queue. Each job is delivered to exactly
//! one worker, which runs every registered checker against the cluster in registry order and
//! persists the results as it goes.
//!
//! ## Failure isolation
//!
//! - A checker returning an error is logged, counted as failed, and its output discarded; the
//!   worker moves on to the next checker for the same cluster.
//! - A single result entry carrying an error is logged and dropped; its siblings are stored.
//!
//! ## Shutdown
//!
//! Workers exit when the queue is closed and drained, or when the pool's cancellation token
//! fires. The token is checked before each job and before each checker, and is handed to
//! checkers so long-running ones can return early.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::channels::{ClusterJob, JobReceiver};
use super::progress::ProgressTracker;
use super::stats::MonitorStats;
use crate::logging::log_checker_operation;
use crate::models::{ClusterSnapshot, WrappedCheckerResult};
use crate::registry::{CheckerRegistry, EntryResult};
use crate::store::Store;

/// Dependencies shared by every worker
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<dyn Store>,
    pub registry: Arc<CheckerRegistry>,
    pub progress: Arc<ProgressTracker>,
    pub stats: Arc<MonitorStats>,
}

impl std::fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerContext")
            .field("checkers", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// Decrements the live worker count however the task ends
struct LiveWorkerGuard(Arc<AtomicUsize>);

impl LiveWorkerGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveWorkerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Finalizes a cluster's progress entry on every exit path of a run
struct RunEndGuard<'a> {
    progress: &'a ProgressTracker,
    uuid: &'a str,
}

impl Drop for RunEndGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.progress.cluster_run_end(self.uuid) {
            error!(cluster = %self.uuid, error = %e, "Closing cluster progress failed");
        }
    }
}

/// Handle to a running pool
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    token: CancellationToken,
    live_workers: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Spawn `count` workers sharing `receiver`
    ///
    /// `live_workers` is incremented by each worker on entry and decremented when it exits.
    pub fn spawn(
        count: usize,
        receiver: JobReceiver,
        context: WorkerContext,
        token: CancellationToken,
        live_workers: Arc<AtomicUsize>,
    ) -> Self {
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..count)
            .map(|id| {
                let worker = Worker {
                    id,
                    context: context.clone(),
                    receiver: Arc::clone(&receiver),
                    token: token.clone(),
                };
                let guard = LiveWorkerGuard::enter(&live_workers);
                tokio::spawn(async move {
                    let _guard = guard;
                    worker.run().await;
                })
            })
            .collect();

        info!(workers = count, "🏊 POOL: Worker pool started");

        Self {
            handles,
            token,
            live_workers,
        }
    }

    #[cfg(test)]
    pub(crate) fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    /// Wait for workers to drain a closed queue, cancelling them after `grace`
    ///
    /// The job queue must already be closed, otherwise workers only exit on cancellation.
    pub async fn shutdown(self, grace: Duration) {
        let WorkerPool { handles, token, .. } = self;
        let count = handles.len();
        let mut all = Box::pin(join_all(handles));

        let results = tokio::select! {
            results = &mut all => results,
            _ = tokio::time::sleep(grace) => {
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "🏊 POOL: Workers did not drain in time, cancelling"
                );
                token.cancel();
                all.await
            }
        };
        // Safety net for any checker still holding the token
        token.cancel();

        let panicked = results.iter().filter(|r| r.is_err()).count();
        if panicked > 0 {
            error!(panicked = panicked, "🏊 POOL: Worker tasks ended abnormally");
        }
        info!(workers = count, "🏊 POOL: Worker pool stopped");
    }
}

struct Worker {
    id: usize,
    context: WorkerContext,
    receiver: Arc<Mutex<JobReceiver>>,
    token: CancellationToken,
}

impl Worker {
    async fn run(self) {
        debug!(worker_id = self.id, "Worker started");

        loop {
            if self.token.is_cancelled() {
                break;
            }

            let job = {
                let mut receiver = self.receiver.lock().await;
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => None,
                    job = receiver.recv() => job,
                }
            };

            let Some(cluster) = job else {
                break;
            };

            if self.token.is_cancelled() {
                break;
            }

            info!(worker_id = self.id, cluster = %cluster.uuid, "Running checkers for cluster");
            let started = Instant::now();
            self.run_checkers(&cluster).await;
            debug!(
                worker_id = self.id,
                cluster = %cluster.uuid,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "All checks run"
            );
        }

        debug!(worker_id = self.id, "Worker exiting");
    }

    async fn run_checkers(&self, cluster: &ClusterJob) {
        let ctx = &self.context;
        let uuid = cluster.uuid.as_str();
        let run_start = Utc::now();

        ctx.progress.cluster_run_start(uuid, ctx.registry.len());
        let _run_end = RunEndGuard {
            progress: &ctx.progress,
            uuid,
        };

        for (name, registered) in ctx.registry.iter() {
            if self.token.is_cancelled() {
                debug!(cluster = %uuid, checker = %name, "Cancelled before checker");
                return;
            }

            let started = Instant::now();
            let output = registered.checker.check(cluster, &self.token).await;
            let failed = output.is_err();

            if let Err(e) = ctx.progress.checker_done(uuid, failed) {
                error!(cluster = %uuid, error = %e, "Could not update cluster progress");
            }
            ctx.stats.record_checker_run(failed);

            match output {
                Ok(entries) => {
                    let stored = self.store_results(cluster, name, run_start, entries).await;
                    log_checker_operation(
                        name,
                        uuid,
                        "completed",
                        started.elapsed().as_millis(),
                        Some(&format!("{stored} results stored")),
                    );
                }
                Err(e) => {
                    error!(cluster = %uuid, checker = %name, error = %e, "Could not run checker");
                    log_checker_operation(
                        name,
                        uuid,
                        "failed",
                        started.elapsed().as_millis(),
                        Some(&e.to_string()),
                    );
                }
            }
        }

        ctx.stats.record_cluster_checked();
    }

    /// Persist one checker's entries, returning how many were stored
    async fn store_results(
        &self,
        cluster: &ClusterSnapshot,
        checker: &str,
        run_start: DateTime<Utc>,
        entries: Vec<EntryResult>,
    ) -> usize {
        let ctx = &self.context;
        let mut stored = 0;

        for entry in entries {
            let mut result: WrappedCheckerResult = match entry {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        cluster = %cluster.uuid,
                        checker = %checker,
                        error = %e,
                        "Encountered error on checker entry"
                    );
                    ctx.stats.record_result_dropped();
                    continue;
                }
            };

            // One run shares one timestamp and always belongs to the dispatched cluster
            result.result.time = run_start;
            result.cluster.clone_from(&cluster.uuid);

            match ctx.store.set_checker_result(&result).await {
                Ok(()) => {
                    stored += 1;
                    ctx.stats.record_result_stored();
                }
                Err(e) => {
                    error!(
                        cluster = %cluster.uuid,
                        checker = %checker,
                        result = %result.result.name,
                        error = %e,
                        "Could not store checker result"
                    );
                    ctx.stats.record_result_dropped();
                }
            }
        }

        stored
    }
}
