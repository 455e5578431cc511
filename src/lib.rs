#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Clustermon Core
//!
//! Checker scheduling and orchestration engine for multi-cluster health monitoring.
//!
//! ## Overview
//!
//! The engine periodically, and on demand, runs a registry of independent checkers against
//! every registered cluster, stores the latest result per checker and scope, tracks in-flight
//! run progress, and hides results that operators have dismissed.
//!
//! ## Key Features
//!
//! - **Bounded worker pool**: a fixed number of workers drain a bounded job queue
//! - **Debounced triggers**: `trigger_check` never blocks and never builds an unbounded backlog
//! - **Failure isolation**: a failing checker or result entry never stops the cycle
//! - **Ordered shutdown**: dispatch stops first, workers drain, then are cancelled
//! - **Read-time dismissals**: removing a dismissal instantly restores matching results
//!
//! ## Module Organization
//!
//! - [`models`] - Cluster snapshots, results, dismissals and progress
//! - [`registry`] - Checker plugin contract and the immutable registry
//! - [`store`] - Persistence contract and the in-memory implementation
//! - [`orchestration`] - Scheduler, worker pool, progress tracker, dismissal filter, janitor
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use clustermon_core::config::ConfigManager;
//! use clustermon_core::models::{CheckerResult, CheckerStatus, ClusterSnapshot, WrappedCheckerResult};
//! use clustermon_core::orchestration::StatusMonitor;
//! use clustermon_core::registry::{checker_fn, CheckerRegistry};
//! use clustermon_core::store::InMemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let store = Arc::new(InMemoryStore::with_clusters([ClusterSnapshot::new("c-1", "prod")]));
//!
//! let registry = CheckerRegistry::builder()
//!     .register(
//!         "clusterName",
//!         checker_fn(|cluster| {
//!             Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
//!                 cluster.uuid.clone(),
//!                 CheckerResult::new("clusterName", CheckerStatus::Good),
//!             ))])
//!         }),
//!     )?
//!     .build();
//!
//! let monitor = StatusMonitor::new(store, registry, manager.config().clone()).await?;
//! monitor.start(manager.config().check_frequency());
//! // ...
//! monitor.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod registry;
pub mod store;

pub use config::{ConfigManager, MonitorConfig};
pub use error::{MonitorError, Result};
pub use models::{
    CheckerResult, CheckerSearch, CheckerStatus, ClusterProgress, ClusterSnapshot,
    ClusterStatusSummary, Dismissal, ProgressStatus, WrappedCheckerResult,
};
pub use orchestration::{FilteredResults, StatusMonitor};
pub use registry::{Checker, CheckerRegistry};
pub use store::{InMemoryStore, Store};
