//! Configuration Loader
//!
//! Layers built-in defaults, an optional TOML file and `CLUSTERMON_*` environment variables
//! (nested keys separated by `__`, e.g. `CLUSTERMON_JANITOR__ENABLED=false`), then validates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, Environment, File, FileFormat};
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::MonitorConfig;

/// Default file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "clustermon.toml";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "CLUSTERMON";

/// Holds the validated configuration and where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: MonitorConfig,
    source_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from `clustermon.toml` (if present) and the environment
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit file. A missing explicit file is an error.
    pub fn load_from(path: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load configuration reading environment overrides under `prefix`
    ///
    /// Useful for testing without touching the process-wide `CLUSTERMON_*` variables.
    pub fn load_with_prefix(path: Option<PathBuf>, prefix: &str) -> ConfigResult<Arc<ConfigManager>> {
        let (file, required) = match path {
            Some(path) => (path, true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        debug!(
            file = %file.display(),
            required = required,
            env_prefix = prefix,
            "Loading monitor configuration"
        );

        let config = Self::build(&file, required, prefix)?;
        config.validate()?;

        let source_file = file.exists().then_some(file);

        info!(
            workers = config.workers,
            check_frequency_seconds = config.check_frequency_seconds,
            job_queue_capacity = config.job_queue_capacity(),
            trigger_queue_capacity = config.trigger_queue_capacity,
            janitor_enabled = config.janitor.enabled,
            source_file = ?source_file,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            source_file,
        }))
    }

    /// Wrap an already-built configuration, validating it
    pub fn from_config(config: MonitorConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            source_file: None,
        }))
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    fn build(file: &Path, required: bool, prefix: &str) -> ConfigResult<MonitorConfig> {
        let defaults = Config::try_from(&MonitorConfig::default())
            .map_err(|e| ConfigurationError::load_error("defaults", e))?;

        Config::builder()
            .add_source(defaults)
            .add_source(
                File::from(file.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<MonitorConfig>())
            .map_err(|e| ConfigurationError::load_error(file.display().to_string(), e))
    }
}
