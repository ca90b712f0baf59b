//! Configuration loading and environment variable handling

use crate::domains::datasource::DatasourceConfig;
use crate::domains::FleetbenchConfig;
use crate::error::{ConfigError, ConfigResult};
use log::debug;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "FLEETBENCH".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<FleetbenchConfig> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let mut config: FleetbenchConfig = if content.trim().is_empty() {
            FleetbenchConfig::default()
        } else {
            serde_yaml::from_str(&content)?
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<FleetbenchConfig> {
        let mut config = FleetbenchConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<FleetbenchConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut FleetbenchConfig) -> ConfigResult<()> {
        self.apply_execution_overrides(&mut config.execution)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_datasource_overrides(&mut config.datasource)?;
        Ok(())
    }

    /// Apply execution config overrides
    fn apply_execution_overrides(
        &self,
        config: &mut crate::domains::execution::ExecutionConfig,
    ) -> ConfigResult<()> {
        if let Ok(interval) = self.get_env_var("POLL_INTERVAL_MS") {
            let millis: u64 = interval
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid POLL_INTERVAL_MS: {}", e)))?;
            config.poll_interval = Duration::from_millis(millis);
            if config.max_poll_interval < config.poll_interval {
                config.max_poll_interval = config.poll_interval;
            }
        }

        if let Ok(concurrency) = self.get_env_var("MAX_CONCURRENT_DISPATCH") {
            config.max_concurrent_dispatch = concurrency.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid MAX_CONCURRENT_DISPATCH: {}", e))
            })?;
        }

        if let Ok(required) = self.get_env_var("REQUIRE_DATASOURCE") {
            config.require_datasource = required.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid REQUIRE_DATASOURCE: {}", e))
            })?;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Apply datasource overrides. A URL alone is not enough to describe a
    /// datasource, so the override only applies to one already configured.
    fn apply_datasource_overrides(
        &self,
        datasource: &mut Option<DatasourceConfig>,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("DATASOURCE_URL") {
            match datasource {
                Some(datasource) => datasource.url = url,
                None => {
                    return Err(ConfigError::EnvError(
                        "DATASOURCE_URL set but no datasource is configured".to_string(),
                    ))
                }
            }
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
