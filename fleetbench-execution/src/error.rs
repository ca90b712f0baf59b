//! Execution error types

use fleetbench_config::ConfigError;
use fleetbench_core::{DocumentError, ValidationError};
use thiserror::Error;

/// Errors that stop a benchmark before or instead of running it.
///
/// Anything that goes wrong after dispatch starts is captured in the run
/// summary instead.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// A named test cannot run against the fleet
    #[error("Test '{test}' failed validation: {source}")]
    Validation {
        test: String,
        source: ValidationError,
    },

    #[error("No datasource is configured and execution.require_datasource is set")]
    MissingDatasource,

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BenchmarkError {
    pub fn validation(test: impl Into<String>, source: ValidationError) -> Self {
        BenchmarkError::Validation {
            test: test.into(),
            source,
        }
    }

    /// The underlying validation failure, if this is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            BenchmarkError::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for benchmark operations
pub type BenchmarkResult<T> = Result<T, BenchmarkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_validation_error_names_the_test() {
        let err = BenchmarkError::validation(
            "4k-random-readwrite",
            ValidationError::InsufficientUnits {
                application: "magpie".to_string(),
                available: 10,
                required: 100,
            },
        );

        let message = err.to_string();
        assert!(message.contains("4k-random-readwrite"));
        assert!(message.contains("10 available, 100 required"));
        assert!(err.source().is_some());
        assert_eq!(err.as_validation().map(|e| e.kind()), Some("insufficient_units"));
        assert!(BenchmarkError::MissingDatasource.as_validation().is_none());
    }
}
