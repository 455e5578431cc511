//! Error types for the cluster monitor.
//!

use thiserror::Error;

use crate::config::ConfigurationError;

/// Failures reported by a [`Store`](crate::store::Store) implementation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Store backend error: {operation} - {reason}")]
    Backend { operation: String, reason: String },
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn backend(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Backend {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Errors a checker can report, either for the whole run or for a single result entry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckerError {
    #[error("Checker failed: {0}")]
    Failed(String),
    #[error("Could not reach {scope}: {reason}")]
    Unreachable { scope: String, reason: String },
    #[error("Checker cancelled")]
    Cancelled,
}

impl CheckerError {
    pub fn failed(reason: impl Into<String>) -> Self {
        CheckerError::Failed(reason.into())
    }

    pub fn unreachable(scope: impl Into<String>, reason: impl Into<String>) -> Self {
        CheckerError::Unreachable {
            scope: scope.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("cluster '{uuid}' not found")]
    ClusterNotFound { uuid: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("checker '{name}' is already registered")]
    DuplicateChecker { name: String },
    #[error("checker name must not be empty")]
    EmptyName,
}

/// Errors returned synchronously to callers of the trigger operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("status monitor not running")]
    NotRunning,
    #[error("status monitor already waiting to run ({capacity} checks queued)")]
    AlreadyWaiting { capacity: usize },
    #[error("job queue closed")]
    QueueClosed,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Checker(#[from] CheckerError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Initialization error: {0}")]
    Initialization(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
