//! # Progress Tracker
//!
//! Ephemeral per-cluster bookkeeping for the current check cycle. The whole map is replaced
//! when a cycle starts; entries move `Waiting → InProgress → Done` as workers pick clusters
//! up and finish them. A single `RwLock` guards the map; updates happen once per checker
//! invocation so contention stays low.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::ProgressError;
use crate::models::{ClusterProgress, ClusterSnapshot, ProgressStatus};

#[derive(Debug, Default)]
struct ProgressState {
    checking: bool,
    last_run: Option<DateTime<Utc>>,
    clusters: HashMap<String, ClusterProgress>,
}

#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: RwLock<ProgressState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset progress for a new cycle, registering every cluster as waiting
    ///
    /// Entries from previous cycles, including finished ones, are discarded.
    pub fn start_checking(&self, clusters: &[ClusterSnapshot]) {
        let mut state = self.state.write();
        state.checking = true;
        state.last_run = Some(Utc::now());
        state.clusters = clusters
            .iter()
            .map(|c| (c.uuid.clone(), ClusterProgress::waiting()))
            .collect();

        debug!(clusters = clusters.len(), "Progress reset for new cycle");
    }

    /// Mark the current cycle as fully distributed
    pub fn finish_checking(&self) {
        self.state.write().checking = false;
    }

    /// Whether a cycle is currently being distributed
    pub fn is_checking(&self) -> bool {
        self.state.read().checking
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_run
    }

    /// Begin a cluster run, replacing any existing entry
    ///
    /// Clusters dispatched outside a cycle have no waiting entry; one is created here.
    pub fn cluster_run_start(&self, uuid: &str, total_checkers: usize) {
        self.state.write().clusters.insert(
            uuid.to_string(),
            ClusterProgress::started(total_checkers, Utc::now()),
        );
    }

    /// Record the outcome of one checker for a running cluster
    pub fn checker_done(&self, uuid: &str, failed: bool) -> Result<(), ProgressError> {
        let mut state = self.state.write();
        let progress = state
            .clusters
            .get_mut(uuid)
            .ok_or_else(|| ProgressError::ClusterNotFound {
                uuid: uuid.to_string(),
            })?;

        // Overlapping runs of one cluster share an entry; never count past the total
        if progress.completed() >= progress.total_checkers {
            debug!(cluster = %uuid, "Ignoring checker completion beyond run total");
            return Ok(());
        }

        if failed {
            progress.failed += 1;
        } else {
            progress.done += 1;
        }
        Ok(())
    }

    /// Finalize a cluster run
    pub fn cluster_run_end(&self, uuid: &str) -> Result<(), ProgressError> {
        let mut state = self.state.write();
        let progress = state
            .clusters
            .get_mut(uuid)
            .ok_or_else(|| ProgressError::ClusterNotFound {
                uuid: uuid.to_string(),
            })?;

        progress.status = ProgressStatus::Done;
        progress.end = Some(Utc::now());
        Ok(())
    }

    /// Copy of the progress entry for a cluster
    pub fn get_progress_for(&self, uuid: &str) -> Result<ClusterProgress, ProgressError> {
        self.state
            .read()
            .clusters
            .get(uuid)
            .cloned()
            .ok_or_else(|| ProgressError::ClusterNotFound {
                uuid: uuid.to_string(),
            })
    }

    #[cfg(test)]
    pub(crate) fn tracked_clusters(&self) -> usize {
        self.state.read().clusters.len()
    }
}
