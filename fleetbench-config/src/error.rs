//! Configuration error types

use thiserror::Error;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `FLEETBENCH_*` override could not be applied
    #[error("Environment variable error: {0}")]
    EnvError(String),

    /// A domain failed validation, e.g. `execution` or `datasource`
    #[error("Invalid {domain} configuration: {message}")]
    DomainError { domain: String, message: String },
}
