//! Engine statistics
//!
//! Lock-free counters updated by the dispatch loop, the workers and the janitor, read through
//! [`MonitorStats::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic statistics for thread-safe updates
#[derive(Debug, Default)]
pub struct MonitorStats {
    cycles_started: AtomicU64,
    cycles_abandoned: AtomicU64,
    jobs_dispatched: AtomicU64,
    clusters_checked: AtomicU64,
    checkers_run: AtomicU64,
    checkers_failed: AtomicU64,
    results_stored: AtomicU64,
    results_dropped: AtomicU64,
    triggers_rejected: AtomicU64,
    janitor_shifts: AtomicU64,
    janitor_removed: AtomicU64,
}

/// Point-in-time copy of [`MonitorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatsSnapshot {
    pub cycles_started: u64,
    pub cycles_abandoned: u64,
    pub jobs_dispatched: u64,
    pub clusters_checked: u64,
    pub checkers_run: u64,
    pub checkers_failed: u64,
    pub results_stored: u64,
    pub results_dropped: u64,
    pub triggers_rejected: u64,
    pub janitor_shifts: u64,
    pub janitor_removed: u64,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Cycle dropped because the cluster list could not be read or shutdown interrupted it
    pub fn record_cycle_abandoned(&self) {
        self.cycles_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_dispatched(&self) {
        self.jobs_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cluster_checked(&self) {
        self.clusters_checked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checker_run(&self, failed: bool) {
        self.checkers_run.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.checkers_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_result_stored(&self) {
        self.results_stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result_dropped(&self) {
        self.results_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trigger_rejected(&self) {
        self.triggers_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_janitor_shift(&self, removed: u64) {
        self.janitor_shifts.fetch_add(1, Ordering::Relaxed);
        self.janitor_removed.fetch_add(removed, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MonitorStatsSnapshot {
        MonitorStatsSnapshot {
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_abandoned: self.cycles_abandoned.load(Ordering::Relaxed),
            jobs_dispatched: self.jobs_dispatched.load(Ordering::Relaxed),
            clusters_checked: self.clusters_checked.load(Ordering::Relaxed),
            checkers_run: self.checkers_run.load(Ordering::Relaxed),
            checkers_failed: self.checkers_failed.load(Ordering::Relaxed),
            results_stored: self.results_stored.load(Ordering::Relaxed),
            results_dropped: self.results_dropped.load(Ordering::Relaxed),
            triggers_rejected: self.triggers_rejected.load(Ordering::Relaxed),
            janitor_shifts: self.janitor_shifts.load(Ordering::Relaxed),
            janitor_removed: self.janitor_removed.load(Ordering::Relaxed),
        }
    }
}
