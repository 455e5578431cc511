//! # Dismissals
//!
//! Persisted suppression rules that hide matching checker results at read time. Stored results
//! are never modified by a dismissal, so deleting one immediately brings matching results back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check_result::WrappedCheckerResult;

/// Granularity a dismissal applies at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissLevel {
    /// Every cluster, every scope
    All,
    Cluster,
    Bucket,
    Node,
}

/// How long a dismissal stays in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "until")]
pub enum DismissalExpiry {
    Forever,
    Until(DateTime<Utc>),
}

impl DismissalExpiry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            DismissalExpiry::Forever => false,
            DismissalExpiry::Until(until) => now > *until,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dismissal {
    pub id: String,
    pub level: DismissLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_uuid: Option<String>,
    pub checker_name: String,
    pub expiry: DismissalExpiry,
}

impl Dismissal {
    fn with_level(level: DismissLevel, checker_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            level,
            cluster_uuid: None,
            bucket_name: None,
            node_uuid: None,
            checker_name: checker_name.into(),
            expiry: DismissalExpiry::Forever,
        }
    }

    /// Dismiss a checker everywhere
    pub fn all(checker_name: impl Into<String>) -> Self {
        Self::with_level(DismissLevel::All, checker_name)
    }

    pub fn for_cluster(checker_name: impl Into<String>, cluster_uuid: impl Into<String>) -> Self {
        Self {
            cluster_uuid: Some(cluster_uuid.into()),
            ..Self::with_level(DismissLevel::Cluster, checker_name)
        }
    }

    pub fn for_bucket(
        checker_name: impl Into<String>,
        cluster_uuid: impl Into<String>,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            cluster_uuid: Some(cluster_uuid.into()),
            bucket_name: Some(bucket_name.into()),
            ..Self::with_level(DismissLevel::Bucket, checker_name)
        }
    }

    pub fn for_node(
        checker_name: impl Into<String>,
        cluster_uuid: impl Into<String>,
        node_uuid: impl Into<String>,
    ) -> Self {
        Self {
            cluster_uuid: Some(cluster_uuid.into()),
            node_uuid: Some(node_uuid.into()),
            ..Self::with_level(DismissLevel::Node, checker_name)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.expiry = DismissalExpiry::Until(until);
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_expired_at(now)
    }

    /// Whether this dismissal's scope contains the result's scope
    pub fn covers(&self, result: &WrappedCheckerResult) -> bool {
        let same_cluster = self.cluster_uuid.as_deref() == Some(result.cluster.as_str());

        match self.level {
            DismissLevel::All => true,
            DismissLevel::Cluster => same_cluster,
            DismissLevel::Bucket => {
                same_cluster && self.bucket_name.as_deref() == result.bucket.as_deref()
            }
            DismissLevel::Node => same_cluster && self.node_uuid.as_deref() == result.node.as_deref(),
        }
    }

    /// Whether the result should be hidden at `now`
    pub fn is_dismissed_at(&self, result: &WrappedCheckerResult, now: DateTime<Utc>) -> bool {
        result.result.name == self.checker_name && !self.is_expired_at(now) && self.covers(result)
    }

    pub fn is_dismissed(&self, result: &WrappedCheckerResult) -> bool {
        self.is_dismissed_at(result, Utc::now())
    }
}

/// Filter for querying, deleting or updating dismissals. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DismissalSearchSpace {
    pub id: Option<String>,
    pub checker_name: Option<String>,
    pub cluster_uuid: Option<String>,
    pub bucket_name: Option<String>,
    pub node_uuid: Option<String>,
    pub level: Option<DismissLevel>,
}

impl DismissalSearchSpace {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn by_cluster(cluster_uuid: impl Into<String>) -> Self {
        Self {
            cluster_uuid: Some(cluster_uuid.into()),
            ..Default::default()
        }
    }

    pub fn by_level(level: DismissLevel) -> Self {
        Self {
            level: Some(level),
            ..Default::default()
        }
    }

    pub fn matches(&self, dismissal: &Dismissal) -> bool {
        fn field_matches(filter: &Option<String>, value: Option<&str>) -> bool {
            filter
                .as_deref()
                .map(|expected| value == Some(expected))
                .unwrap_or(true)
        }

        field_matches(&self.id, Some(dismissal.id.as_str()))
            && field_matches(&self.checker_name, Some(dismissal.checker_name.as_str()))
            && field_matches(&self.cluster_uuid, dismissal.cluster_uuid.as_deref())
            && field_matches(&self.bucket_name, dismissal.bucket_name.as_deref())
            && field_matches(&self.node_uuid, dismissal.node_uuid.as_deref())
            && self.level.map(|l| l == dismissal.level).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::check_result::{CheckerResult, CheckerStatus};
    use chrono::Duration;

    fn result(checker: &str) -> CheckerResult {
        CheckerResult::new(checker, CheckerStatus::Warn)
    }

    #[test]
    fn test_all_level_matches_any_cluster() {
        let dismissal = Dismissal::all("mixedMode");
        let r1 = WrappedCheckerResult::cluster_scoped("c-1", result("mixedMode"));
        let r2 = WrappedCheckerResult::node_scoped("c-2", "n-9", result("mixedMode"));

        assert!(dismissal.is_dismissed(&r1));
        assert!(dismissal.is_dismissed(&r2));
    }

    #[test]
    fn test_checker_name_must_match() {
        let dismissal = Dismissal::for_cluster("mixedMode", "c-1");
        let other = WrappedCheckerResult::cluster_scoped("c-1", result("maxBuckets"));
        assert!(!dismissal.is_dismissed(&other));
    }

    #[test]
    fn test_cluster_level_contains_node_and_bucket_scopes() {
        let dismissal = Dismissal::for_cluster("unhealthyNode", "c-1");

        let node = WrappedCheckerResult::node_scoped("c-1", "n-1", result("unhealthyNode"));
        let elsewhere =
            WrappedCheckerResult::node_scoped("c-2", "n-1", result("unhealthyNode"));

        assert!(dismissal.is_dismissed(&node));
        assert!(!dismissal.is_dismissed(&elsewhere));
    }

    #[test]
    fn test_bucket_level_requires_cluster_and_bucket() {
        let dismissal = Dismissal::for_bucket("residentRatio", "c-1", "travel");

        let hit =
            WrappedCheckerResult::bucket_scoped("c-1", "travel", result("residentRatio"));
        let wrong_bucket =
            WrappedCheckerResult::bucket_scoped("c-1", "beer", result("residentRatio"));
        let cluster_wide = WrappedCheckerResult::cluster_scoped("c-1", result("residentRatio"));

        assert!(dismissal.is_dismissed(&hit));
        assert!(!dismissal.is_dismissed(&wrong_bucket));
        assert!(!dismissal.is_dismissed(&cluster_wide));
    }

    #[test]
    fn test_node_level_requires_cluster_and_node() {
        let dismissal = Dismissal::for_node("swapUsage", "c-1", "n-1");

        let hit = WrappedCheckerResult::node_scoped("c-1", "n-1", result("swapUsage"));
        let other_node = WrappedCheckerResult::node_scoped("c-1", "n-2", result("swapUsage"));

        assert!(dismissal.is_dismissed(&hit));
        assert!(!dismissal.is_dismissed(&other_node));
    }

    #[test]
    fn test_expired_dismissal_never_matches() {
        let now = Utc::now();
        let dismissal = Dismissal::all("mixedMode").until(now - Duration::minutes(1));
        let r = WrappedCheckerResult::cluster_scoped("c-1", result("mixedMode"));

        assert!(dismissal.is_expired_at(now));
        assert!(!dismissal.is_dismissed_at(&r, now));

        let live = Dismissal::all("mixedMode").until(now + Duration::hours(1));
        assert!(live.is_dismissed_at(&r, now));
    }

    #[test]
    fn test_search_space_matching() {
        let dismissal = Dismissal::for_node("swapUsage", "c-1", "n-1").with_id("D0");

        assert!(DismissalSearchSpace::default().matches(&dismissal));
        assert!(DismissalSearchSpace::by_id("D0").matches(&dismissal));
        assert!(DismissalSearchSpace::by_cluster("c-1").matches(&dismissal));
        assert!(!DismissalSearchSpace::by_cluster("c-2").matches(&dismissal));
        assert!(DismissalSearchSpace::by_level(DismissLevel::Node).matches(&dismissal));
        assert!(!DismissalSearchSpace::by_level(DismissLevel::All).matches(&dismissal));
    }
}
