//! Domain-specific configuration modules

pub mod datasource;
pub mod execution;
pub mod logging;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Fleetbench configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FleetbenchConfig {
    /// Benchmark execution configuration
    #[serde(default)]
    pub execution: execution::ExecutionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Metrics backend the benchmark results are read from (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<datasource::DatasourceConfig>,
}

impl FleetbenchConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.execution.validate()?;
        self.logging.validate()?;

        if let Some(ref datasource) = self.datasource {
            datasource.validate()?;
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = FleetbenchConfig {
            datasource: Some(datasource::DatasourceConfig::sample()),
            ..Default::default()
        };
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FleetbenchConfig::default();
        assert!(config.validate_all().is_ok());
        assert!(config.datasource.is_none());
    }

    #[test]
    fn test_sample_round_trips() {
        let sample = FleetbenchConfig::generate_sample();
        let parsed: FleetbenchConfig = serde_yaml::from_str(&sample).unwrap();
        assert!(parsed.validate_all().is_ok());
        assert!(parsed.datasource.is_some());
    }
}
