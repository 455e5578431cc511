//! # Structured Logging Module
//!
//! Environment-aware structured logging for the monitor's async task tree.

use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` wins over the environment default. `CLUSTERMON_LOG_FORMAT=json` switches the
/// console output to JSON lines. Safe to call more than once.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var("CLUSTERMON_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let console = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A global subscriber may already be installed by an embedding application
        if tracing_subscriber::registry().with(console).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("CLUSTERMON_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for a check cycle
pub fn log_cycle_operation(operation: &str, clusters: usize, status: &str, details: Option<&str>) {
    tracing::info!(
        operation = %operation,
        clusters = clusters,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "CYCLE_OPERATION"
    );
}

/// Log structured data for a single checker run against a cluster
pub fn log_checker_operation(
    checker: &str,
    cluster: &str,
    status: &str,
    elapsed_ms: u128,
    details: Option<&str>,
) {
    tracing::debug!(
        checker = %checker,
        cluster = %cluster,
        status = %status,
        elapsed_ms = elapsed_ms as u64,
        details = details,
        "CHECKER_OPERATION"
    );
}
