//! # Cluster Progress
//!
//! Ephemeral, in-memory bookkeeping of how far a cycle has got for one cluster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run state of a cluster within the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Waiting,
    InProgress,
    Done,
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressStatus::Waiting => write!(f, "waiting"),
            ProgressStatus::InProgress => write!(f, "in progress"),
            ProgressStatus::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterProgress {
    pub status: ProgressStatus,
    pub total_checkers: usize,
    pub done: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl ClusterProgress {
    pub fn waiting() -> Self {
        Self {
            status: ProgressStatus::Waiting,
            total_checkers: 0,
            done: 0,
            failed: 0,
            start: None,
            end: None,
        }
    }

    pub fn started(total_checkers: usize, start: DateTime<Utc>) -> Self {
        Self {
            status: ProgressStatus::InProgress,
            total_checkers,
            start: Some(start),
            ..Self::waiting()
        }
    }

    /// Checkers that have finished, successfully or not
    pub fn completed(&self) -> usize {
        self.done + self.failed
    }

    pub fn is_done(&self) -> bool {
        self.status == ProgressStatus::Done
    }
}
