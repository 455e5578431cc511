//! # Store Contract
//!
//! Persistence boundary used by the monitor. Implementations must be safe for concurrent use
//! by every worker; the engine adds no locking of its own around store calls.
//!
//! - [`Store`] - async persistence trait
//! - [`InMemoryStore`] - `DashMap`-backed implementation for single-process deployments and tests

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{
    CheckerSearch, ClusterSnapshot, Dismissal, DismissalSearchSpace, WrappedCheckerResult,
};

pub use memory::InMemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Checked at construction time; an error here aborts initialization
    async fn is_initialized(&self) -> StoreResult<bool>;

    // clusters
    async fn get_clusters(&self, active_only: bool) -> StoreResult<Vec<ClusterSnapshot>>;
    async fn get_cluster(&self, uuid: &str) -> StoreResult<ClusterSnapshot>;
    async fn upsert_cluster(&self, cluster: ClusterSnapshot) -> StoreResult<()>;
    /// Removes the cluster together with its stored results and dismissals
    async fn delete_cluster(&self, uuid: &str) -> StoreResult<()>;

    // checker results
    /// Upsert keyed by `(cluster, checker, node?, bucket?)`
    async fn set_checker_result(&self, result: &WrappedCheckerResult) -> StoreResult<()>;
    async fn get_checker_results(
        &self,
        search: &CheckerSearch,
    ) -> StoreResult<Vec<WrappedCheckerResult>>;
    async fn delete_checker_results(&self, search: &CheckerSearch) -> StoreResult<u64>;
    async fn delete_results_for_unknown_nodes(
        &self,
        cluster_uuid: &str,
        known_nodes: &[String],
    ) -> StoreResult<u64>;
    async fn delete_results_for_unknown_buckets(
        &self,
        cluster_uuid: &str,
        known_buckets: &[String],
    ) -> StoreResult<u64>;

    // dismissals
    async fn add_dismissal(&self, dismissal: Dismissal) -> StoreResult<()>;
    async fn get_dismissals(&self, search: &DismissalSearchSpace) -> StoreResult<Vec<Dismissal>>;
    async fn delete_dismissals(&self, search: &DismissalSearchSpace) -> StoreResult<u64>;
    async fn delete_expired_dismissals(&self, now: DateTime<Utc>) -> StoreResult<u64>;
    async fn delete_dismissals_for_unknown_nodes(
        &self,
        cluster_uuid: &str,
        known_nodes: &[String],
    ) -> StoreResult<u64>;
    async fn delete_dismissals_for_unknown_buckets(
        &self,
        cluster_uuid: &str,
        known_buckets: &[String],
    ) -> StoreResult<u64>;
}
