//! # Cluster Snapshot
//!
//! Immutable view of a registered cluster handed to checkers at dispatch time. A snapshot is
//! never mutated once it has been submitted to a job; changes to the underlying cluster become
//! visible on the next cycle when the store is listed again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason the most recent heartbeat against a cluster failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartIssue {
    #[default]
    None,
    BadAuth,
    NoConnection,
    UuidMismatch,
}

/// Summary of a single node in a cluster
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeSummary {
    pub node_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
}

impl NodeSummary {
    pub fn new(node_uuid: impl Into<String>) -> Self {
        Self {
            node_uuid: node_uuid.into(),
            ..Default::default()
        }
    }
}

/// Summary of a single bucket in a cluster
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BucketSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_type: Option<String>,
    #[serde(default)]
    pub quota_bytes: u64,
}

impl BucketSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Point-in-time snapshot of a cluster as known to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeSummary>,
    #[serde(default)]
    pub buckets: Vec<BucketSummary>,
    #[serde(default)]
    pub heartbeat_issue: HeartIssue,
    pub last_update: DateTime<Utc>,
}

impl ClusterSnapshot {
    /// Create a snapshot with no nodes or buckets, last updated now
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            nodes: Vec::new(),
            buckets: Vec::new(),
            heartbeat_issue: HeartIssue::None,
            last_update: Utc::now(),
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<NodeSummary>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_buckets(mut self, buckets: Vec<BucketSummary>) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn with_heartbeat_issue(mut self, issue: HeartIssue) -> Self {
        self.heartbeat_issue = issue;
        self
    }

    /// A cluster is active while its last heartbeat succeeded
    pub fn is_active(&self) -> bool {
        self.heartbeat_issue == HeartIssue::None
    }

    pub fn node_uuids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.node_uuid.clone()).collect()
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.iter().map(|b| b.name.clone()).collect()
    }
}
