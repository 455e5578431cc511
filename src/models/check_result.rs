//! # Checker Results
//!
//! Findings produced by checkers, scoped to a cluster and optionally to a node or bucket.
//! Results are stored by identity key `(cluster, checker, node?, bucket?)`; a newer result for
//! the same key replaces the previous one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a checker finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerStatus {
    Good,
    Warn,
    Alert,
    Info,
    Missing,
}

impl CheckerStatus {
    /// Numeric code used when ordering results by severity
    pub fn code(&self) -> i32 {
        match self {
            CheckerStatus::Good => 0,
            CheckerStatus::Info => 10,
            CheckerStatus::Warn => 20,
            CheckerStatus::Alert => 30,
            CheckerStatus::Missing => -1,
        }
    }

    /// Alerting severity label, `None` for statuses that never alert
    pub fn severity(&self) -> Option<&'static str> {
        match self {
            CheckerStatus::Info => Some("info"),
            CheckerStatus::Warn => Some("warning"),
            CheckerStatus::Alert => Some("critical"),
            CheckerStatus::Good | CheckerStatus::Missing => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckerStatus::Good => "good",
            CheckerStatus::Warn => "warn",
            CheckerStatus::Alert => "alert",
            CheckerStatus::Info => "info",
            CheckerStatus::Missing => "missing",
        }
    }
}

impl std::fmt::Display for CheckerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding of a checker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerResult {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub status: CheckerStatus,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub version: i32,
}

impl CheckerResult {
    pub fn new(name: impl Into<String>, status: CheckerStatus) -> Self {
        Self {
            name: name.into(),
            remediation: None,
            value: None,
            status,
            time: Utc::now(),
            version: 0,
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// A checker result together with the scope it applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedCheckerResult {
    pub result: CheckerResult,
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

impl WrappedCheckerResult {
    /// Result scoped to the whole cluster
    pub fn cluster_scoped(cluster: impl Into<String>, result: CheckerResult) -> Self {
        Self {
            result,
            cluster: cluster.into(),
            node: None,
            bucket: None,
        }
    }

    pub fn node_scoped(
        cluster: impl Into<String>,
        node: impl Into<String>,
        result: CheckerResult,
    ) -> Self {
        Self {
            result,
            cluster: cluster.into(),
            node: Some(node.into()),
            bucket: None,
        }
    }

    pub fn bucket_scoped(
        cluster: impl Into<String>,
        bucket: impl Into<String>,
        result: CheckerResult,
    ) -> Self {
        Self {
            result,
            cluster: cluster.into(),
            node: None,
            bucket: Some(bucket.into()),
        }
    }

    pub fn checker_name(&self) -> &str {
        &self.result.name
    }

    /// Storage identity of this result
    pub fn key(&self) -> ResultKey {
        ResultKey {
            cluster: self.cluster.clone(),
            checker: self.result.name.clone(),
            node: self.node.clone(),
            bucket: self.bucket.clone(),
        }
    }
}

/// Upsert key for stored results
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey {
    pub cluster: String,
    pub checker: String,
    pub node: Option<String>,
    pub bucket: Option<String>,
}

/// Filter for querying stored results. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckerSearch {
    pub name: Option<String>,
    pub cluster: Option<String>,
    pub node: Option<String>,
    pub bucket: Option<String>,
}

impl CheckerSearch {
    pub fn for_cluster(cluster: impl Into<String>) -> Self {
        Self {
            cluster: Some(cluster.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn matches(&self, result: &WrappedCheckerResult) -> bool {
        fn field_matches(filter: &Option<String>, value: Option<&str>) -> bool {
            match filter {
                Some(expected) => value == Some(expected.as_str()),
                None => true,
            }
        }

        field_matches(&self.name, Some(result.result.name.as_str()))
            && field_matches(&self.cluster, Some(result.cluster.as_str()))
            && field_matches(&self.node, result.node.as_deref())
            && field_matches(&self.bucket, result.bucket.as_deref())
    }
}

/// Per-status counts for a cluster's results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatusSummary {
    pub good: u64,
    pub warnings: u64,
    pub alerts: u64,
    pub info: u64,
    pub missing: u64,
    pub dismissed: u64,
}

impl ClusterStatusSummary {
    pub fn from_results(results: &[WrappedCheckerResult], dismissed: usize) -> Self {
        let mut summary = Self {
            dismissed: dismissed as u64,
            ..Default::default()
        };

        for result in results {
            match result.result.status {
                CheckerStatus::Good => summary.good += 1,
                CheckerStatus::Warn => summary.warnings += 1,
                CheckerStatus::Alert => summary.alerts += 1,
                CheckerStatus::Info => summary.info += 1,
                CheckerStatus::Missing => summary.missing += 1,
            }
        }

        summary
    }
}
