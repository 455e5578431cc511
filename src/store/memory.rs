//! In-memory store backed by `DashMap`.
//!
//! Suitable for single-process deployments, demos and the test suite. All operations are
//! lock-free from the caller's point of view and safe to call from every worker at once.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::{Store, StoreResult};
use crate::error::StoreError;
use crate::models::{
    CheckerSearch, ClusterSnapshot, DismissLevel, Dismissal, DismissalSearchSpace, ResultKey,
    WrappedCheckerResult,
};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    clusters: DashMap<String, ClusterSnapshot>,
    results: DashMap<ResultKey, WrappedCheckerResult>,
    dismissals: DashMap<String, Dismissal>,
    unavailable: AtomicBool,
    result_writes: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with clusters
    pub fn with_clusters(clusters: impl IntoIterator<Item = ClusterSnapshot>) -> Self {
        let store = Self::new();
        for cluster in clusters {
            store.clusters.insert(cluster.uuid.clone(), cluster);
        }
        store
    }

    /// Simulate a backend outage; every call fails with [`StoreError::Unavailable`] while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total number of checker result upserts accepted so far
    pub fn result_writes(&self) -> u64 {
        self.result_writes.load(Ordering::SeqCst)
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".into()));
        }
        Ok(())
    }

    fn remove_results_where<F>(&self, predicate: F) -> u64
    where
        F: Fn(&WrappedCheckerResult) -> bool,
    {
        let before = self.results.len();
        self.results.retain(|_, result| !predicate(result));
        (before - self.results.len()) as u64
    }

    fn remove_dismissals_where<F>(&self, predicate: F) -> u64
    where
        F: Fn(&Dismissal) -> bool,
    {
        let before = self.dismissals.len();
        self.dismissals.retain(|_, dismissal| !predicate(dismissal));
        (before - self.dismissals.len()) as u64
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn is_initialized(&self) -> StoreResult<bool> {
        self.ensure_available()?;
        Ok(true)
    }

    async fn get_clusters(&self, active_only: bool) -> StoreResult<Vec<ClusterSnapshot>> {
        self.ensure_available()?;
        let mut clusters: Vec<ClusterSnapshot> = self
            .clusters
            .iter()
            .filter(|entry| !active_only || entry.value().is_active())
            .map(|entry| entry.value().clone())
            .collect();
        clusters.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        Ok(clusters)
    }

    async fn get_cluster(&self, uuid: &str) -> StoreResult<ClusterSnapshot> {
        self.ensure_available()?;
        self.clusters
            .get(uuid)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found("cluster", uuid))
    }

    async fn upsert_cluster(&self, cluster: ClusterSnapshot) -> StoreResult<()> {
        self.ensure_available()?;
        self.clusters.insert(cluster.uuid.clone(), cluster);
        Ok(())
    }

    async fn delete_cluster(&self, uuid: &str) -> StoreResult<()> {
        self.ensure_available()?;
        if self.clusters.remove(uuid).is_none() {
            return Err(StoreError::not_found("cluster", uuid));
        }

        let results = self.remove_results_where(|r| r.cluster == uuid);
        let dismissals =
            self.remove_dismissals_where(|d| d.cluster_uuid.as_deref() == Some(uuid));
        debug!(
            cluster = uuid,
            results = results,
            dismissals = dismissals,
            "Deleted cluster and its dependent data"
        );
        Ok(())
    }

    async fn set_checker_result(&self, result: &WrappedCheckerResult) -> StoreResult<()> {
        self.ensure_available()?;
        self.results.insert(result.key(), result.clone());
        self.result_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_checker_results(
        &self,
        search: &CheckerSearch,
    ) -> StoreResult<Vec<WrappedCheckerResult>> {
        self.ensure_available()?;
        let mut matching: Vec<(ResultKey, WrappedCheckerResult)> = self
            .results
            .iter()
            .filter(|entry| search.matches(entry.value()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        matching.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(matching.into_iter().map(|(_, result)| result).collect())
    }

    async fn delete_checker_results(&self, search: &CheckerSearch) -> StoreResult<u64> {
        self.ensure_available()?;
        Ok(self.remove_results_where(|r| search.matches(r)))
    }

    async fn delete_results_for_unknown_nodes(
        &self,
        cluster_uuid: &str,
        known_nodes: &[String],
    ) -> StoreResult<u64> {
        self.ensure_available()?;
        let known: HashSet<&str> = known_nodes.iter().map(String::as_str).collect();
        Ok(self.remove_results_where(|r| {
            r.cluster == cluster_uuid
                && r.node.as_deref().is_some_and(|node| !known.contains(node))
        }))
    }

    async fn delete_results_for_unknown_buckets(
        &self,
        cluster_uuid: &str,
        known_buckets: &[String],
    ) -> StoreResult<u64> {
        self.ensure_available()?;
        let known: HashSet<&str> = known_buckets.iter().map(String::as_str).collect();
        Ok(self.remove_results_where(|r| {
            r.cluster == cluster_uuid
                && r.bucket.as_deref().is_some_and(|bucket| !known.contains(bucket))
        }))
    }

    async fn add_dismissal(&self, dismissal: Dismissal) -> StoreResult<()> {
        self.ensure_available()?;
        self.dismissals.insert(dismissal.id.clone(), dismissal);
        Ok(())
    }

    async fn get_dismissals(&self, search: &DismissalSearchSpace) -> StoreResult<Vec<Dismissal>> {
        self.ensure_available()?;
        let mut dismissals: Vec<Dismissal> = self
            .dismissals
            .iter()
            .filter(|entry| search.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        dismissals.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(dismissals)
    }

    async fn delete_dismissals(&self, search: &DismissalSearchSpace) -> StoreResult<u64> {
        self.ensure_available()?;
        Ok(self.remove_dismissals_where(|d| search.matches(d)))
    }

    async fn delete_expired_dismissals(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        self.ensure_available()?;
        Ok(self.remove_dismissals_where(|d| d.is_expired_at(now)))
    }

    async fn delete_dismissals_for_unknown_nodes(
        &self,
        cluster_uuid: &str,
        known_nodes: &[String],
    ) -> StoreResult<u64> {
        self.ensure_available()?;
        let known: HashSet<&str> = known_nodes.iter().map(String::as_str).collect();
        Ok(self.remove_dismissals_where(|d| {
            d.level == DismissLevel::Node
                && d.cluster_uuid.as_deref() == Some(cluster_uuid)
                && d.node_uuid.as_deref().is_some_and(|node| !known.contains(node))
        }))
    }

    async fn delete_dismissals_for_unknown_buckets(
        &self,
        cluster_uuid: &str,
        known_buckets: &[String],
    ) -> StoreResult<u64> {
        self.ensure_available()?;
        let known: HashSet<&str> = known_buckets.iter().map(String::as_str).collect();
        Ok(self.remove_dismissals_where(|d| {
            d.level == DismissLevel::Bucket
                && d.cluster_uuid.as_deref() == Some(cluster_uuid)
                && d.bucket_name.as_deref().is_some_and(|bucket| !known.contains(bucket))
        }))
    }
}
