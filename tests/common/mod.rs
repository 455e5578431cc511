//! Shared fakes and helpers for integration tests.

#![allow(dead_code)]

pub mod strategies;

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clustermon_core::config::{JanitorConfig, MonitorConfig};
use clustermon_core::error::CheckerError;
use clustermon_core::models::{
    CheckerResult, CheckerStatus, ClusterSnapshot, NodeSummary, WrappedCheckerResult,
};
use clustermon_core::orchestration::StatusMonitor;
use clustermon_core::registry::{checker_fn, Checker, CheckerOutput, CheckerRegistry};
use clustermon_core::store::InMemoryStore;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Engine settings sized for tests: two workers, janitor off
pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        workers: 2,
        shutdown_grace_period_ms: 2_000,
        janitor: JanitorConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn cluster(uuid: &str) -> ClusterSnapshot {
    ClusterSnapshot::new(uuid, format!("{uuid}-name"))
        .with_nodes(vec![NodeSummary::new(format!("{uuid}-node-1"))])
}

pub fn store_with(uuids: &[&str]) -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_clusters(uuids.iter().map(|u| cluster(u))))
}

pub async fn build_monitor(store: Arc<InMemoryStore>, registry: CheckerRegistry) -> StatusMonitor {
    StatusMonitor::new(store, registry, test_config())
        .await
        .expect("monitor should build against a healthy store")
}

/// Returns one cluster-scoped result with `status`
pub fn status_checker(name: &'static str, status: CheckerStatus) -> impl Checker {
    checker_fn(move |cluster| {
        Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
            cluster.uuid.clone(),
            CheckerResult::new(name, status).with_value(serde_json::json!({ "nodes": cluster.nodes.len() })),
        ))])
    })
}

/// Fails the whole checker run
pub fn failing_checker() -> impl Checker {
    checker_fn(|_| Err(CheckerError::failed("checker exploded")))
}

/// Succeeds, but its only entry carries an error
pub fn erroring_entry_checker() -> impl Checker {
    checker_fn(|cluster| Ok(vec![Err(CheckerError::unreachable(cluster.uuid.clone(), "connection refused"))]))
}

/// Counts invocations and returns a single good result
#[derive(Debug, Clone)]
pub struct CountingChecker {
    pub name: &'static str,
    pub calls: Arc<AtomicUsize>,
}

impl CountingChecker {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Checker for CountingChecker {
    async fn check(&self, cluster: &ClusterSnapshot, _cancel: &CancellationToken) -> CheckerOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
            cluster.uuid.clone(),
            CheckerResult::new(self.name, CheckerStatus::Good),
        ))])
    }
}

/// Sleeps before answering; returns early when cancelled
#[derive(Debug, Clone)]
pub struct SlowChecker {
    pub name: &'static str,
    pub delay: Duration,
}

#[async_trait]
impl Checker for SlowChecker {
    async fn check(&self, cluster: &ClusterSnapshot, cancel: &CancellationToken) -> CheckerOutput {
        tokio::select! {
            _ = cancel.cancelled() => Err(CheckerError::Cancelled),
            _ = tokio::time::sleep(self.delay) => Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
                cluster.uuid.clone(),
                CheckerResult::new(self.name, CheckerStatus::Info),
            ))]),
        }
    }
}

/// Blocks every run until [`GatedChecker::open`] is called or the run is cancelled
#[derive(Debug, Clone)]
pub struct GatedChecker {
    pub name: &'static str,
    gate: Arc<Semaphore>,
    started: Arc<AtomicUsize>,
}

impl GatedChecker {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            gate: Arc::new(Semaphore::new(0)),
            started: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Runs that have entered the checker, finished or not
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Let every current and future run through
    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl Checker for GatedChecker {
    async fn check(&self, cluster: &ClusterSnapshot, cancel: &CancellationToken) -> CheckerOutput {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = cancel.cancelled() => Err(CheckerError::Cancelled),
            permit = self.gate.acquire() => {
                drop(permit);
                Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
                    cluster.uuid.clone(),
                    CheckerResult::new(self.name, CheckerStatus::Good),
                ))])
            }
        }
    }
}

/// Single worker with a one-slot job queue, so the second queued job already waits
pub fn single_slot_config() -> MonitorConfig {
    MonitorConfig {
        workers: 1,
        job_queue_multiplier: 1,
        shutdown_grace_period_ms: 100,
        ..test_config()
    }
}

/// Poll a synchronous condition every 10ms until it holds or `timeout` passes
pub async fn wait_until<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Async flavour of [`wait_until`]
pub async fn wait_until_async<F, Fut>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition().await
}

/// Whether every listed cluster has finished its run
pub fn all_done(monitor: &StatusMonitor, uuids: &[&str]) -> bool {
    uuids.iter().all(|uuid| {
        monitor
            .get_progress_for(uuid)
            .map(|p| p.is_done())
            .unwrap_or(false)
    })
}
