//! # Data Model
//!
//! Value types shared by the scheduler, the worker pool, the store contract and the read path.
//!
//! - [`cluster`] - Cluster snapshots handed to checkers
//! - [`check_result`] - Scoped checker findings, search filters and summaries
//! - [`dismissal`] - Suppression rules and their matching predicate
//! - [`progress`] - Per-cluster run progress

pub mod check_result;
pub mod cluster;
pub mod dismissal;
pub mod progress;

pub use check_result::{
    CheckerResult, CheckerSearch, CheckerStatus, ClusterStatusSummary, ResultKey,
    WrappedCheckerResult,
};
pub use cluster::{BucketSummary, ClusterSnapshot, HeartIssue, NodeSummary};
pub use dismissal::{DismissLevel, Dismissal, DismissalExpiry, DismissalSearchSpace};
pub use progress::{ClusterProgress, ProgressStatus};
