//! # Orchestration Engine
//!
//! Checker scheduling and execution for every registered cluster.
//!
//! ## Architecture
//!
//! ```text
//!  timer ─┐
//!  trigger_check ─▶ trigger queue ─▶ Scheduler ──┐
//!                                                ├─▶ job queue ─▶ WorkerPool ─▶ Store
//!  trigger_for ──────────────────────────────────┘                    │
//!                                                                     ▼
//!  read path ◀── DismissalFilter ◀── Store               ProgressTracker
//! ```
//!
//! ## Core Components
//!
//! - **StatusMonitor**: lifecycle facade and read path used by API handlers
//! - **Scheduler**: periodic timer, debounced trigger queue and per-cycle fan-out
//! - **WorkerPool**: fixed set of workers running every checker for each dequeued cluster
//! - **ProgressTracker**: in-memory `Waiting → InProgress → Done` state per cluster
//! - **DismissalFilter**: read-time suppression of results matched by dismissals
//! - **Janitor**: periodic removal of stale results and dismissals
//!
//! The scheduler and the worker pool run under separate cancellation tokens so shutdown can
//! stop new work before the workers are torn down.

pub mod channels;
pub mod dismissal_filter;
pub mod janitor;
pub mod monitor;
pub mod progress;
pub mod scheduler;
pub mod stats;
pub mod worker_pool;

pub use channels::{ChannelFactory, ClusterJob, CycleTrigger, JobReceiver, JobSender};
pub use dismissal_filter::{apply_dismissals, dismissals_for_cluster, filter_dismissed, FilteredResults};
pub use janitor::Janitor;
pub use monitor::StatusMonitor;
pub use progress::ProgressTracker;
pub use scheduler::Scheduler;
pub use stats::{MonitorStats, MonitorStatsSnapshot};
pub use worker_pool::{WorkerContext, WorkerPool};
