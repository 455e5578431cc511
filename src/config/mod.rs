//! # Monitor Configuration
//!
//! Construction-time settings for the status monitor. Worker count and queue capacities are
//! fixed once the engine is built; the check frequency is handed to `start`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clustermon_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Defaults, then `clustermon.toml` if present, then CLUSTERMON_* environment variables
//! let manager = ConfigManager::load()?;
//!
//! let workers = manager.config().workers;
//! let job_queue = manager.config().job_queue_capacity();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Number of concurrently executing check workers
    pub workers: usize,

    /// Seconds between periodic check cycles
    pub check_frequency_seconds: u64,

    /// Pending trigger slots; triggers beyond this are rejected
    pub trigger_queue_capacity: usize,

    /// Job queue capacity as a multiple of the worker count
    pub job_queue_multiplier: usize,

    /// How long `stop` lets workers drain the closed job queue before cancelling them
    pub shutdown_grace_period_ms: u64,

    /// Only dispatch clusters whose last heartbeat succeeded
    pub active_clusters_only: bool,

    /// Stale data cleanup
    pub janitor: JanitorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            check_frequency_seconds: 300,
            trigger_queue_capacity: 10,
            job_queue_multiplier: 4,
            shutdown_grace_period_ms: 5_000,
            active_clusters_only: true,
            janitor: JanitorConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn job_queue_capacity(&self) -> usize {
        self.workers * self.job_queue_multiplier
    }

    pub fn check_frequency(&self) -> Duration {
        Duration::from_secs(self.check_frequency_seconds)
    }

    pub fn shutdown_grace_period(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_period_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.workers == 0 {
            return Err(ConfigurationError::invalid_value(
                "workers",
                self.workers,
                "at least one worker is required",
            ));
        }
        if self.check_frequency_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "check_frequency_seconds",
                self.check_frequency_seconds,
                "check frequency must be positive",
            ));
        }
        if self.trigger_queue_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "trigger_queue_capacity",
                self.trigger_queue_capacity,
                "trigger queue needs room for the initial trigger",
            ));
        }
        if self.job_queue_multiplier == 0 {
            return Err(ConfigurationError::invalid_value(
                "job_queue_multiplier",
                self.job_queue_multiplier,
                "job queue capacity must be positive",
            ));
        }

        self.janitor.validate()
    }
}

/// Settings for the periodic stale-data cleanup
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JanitorConfig {
    pub enabled: bool,
    pub frequency_seconds: u64,
    /// Pending forced shifts; further requests are rejected
    pub trigger_queue_capacity: usize,
    /// Results of log-type checkers older than this are removed
    pub log_alert_max_age_seconds: u64,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency_seconds: 3_600,
            trigger_queue_capacity: 20,
            log_alert_max_age_seconds: 3_600,
        }
    }
}

impl JanitorConfig {
    pub fn frequency(&self) -> Duration {
        Duration::from_secs(self.frequency_seconds)
    }

    pub fn log_alert_max_age(&self) -> Duration {
        Duration::from_secs(self.log_alert_max_age_seconds)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.enabled && self.frequency_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "janitor.frequency_seconds",
                self.frequency_seconds,
                "janitor frequency must be positive when enabled",
            ));
        }
        if self.trigger_queue_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "janitor.trigger_queue_capacity",
                self.trigger_queue_capacity,
                "janitor trigger queue capacity must be positive",
            ));
        }
        Ok(())
    }
}
