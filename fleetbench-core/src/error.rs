//! Core error types for Fleetbench

use thiserror::Error;

/// Reasons a test specification cannot run against the resolved fleet.
///
/// These are fatal to a run and are always surfaced before any action
/// is dispatched. They are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unable to find model {model}: {reason}")]
    UnknownModel { model: String, reason: String },

    #[error("Unable to find application {application}: {reason}")]
    UnknownApplication { application: String, reason: String },

    #[error("Not enough units for {application} to execute test: {available} available, {required} required")]
    InsufficientUnits {
        application: String,
        available: usize,
        required: usize,
    },

    #[error("Application {application} does not offer action {action}")]
    UnknownAction { application: String, action: String },

    #[error("Action {action} requires parameter {parameter}")]
    MissingParameter { action: String, parameter: String },
}

impl ValidationError {
    /// Short machine-readable kind, used in logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::UnknownModel { .. } => "unknown_model",
            ValidationError::UnknownApplication { .. } => "unknown_application",
            ValidationError::InsufficientUnits { .. } => "insufficient_units",
            ValidationError::UnknownAction { .. } => "unknown_action",
            ValidationError::MissingParameter { .. } => "missing_parameter",
        }
    }
}

/// Per-action dispatch failures.
///
/// A dispatch error is recorded against the single action it belongs to
/// and never aborts the surrounding batch or run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Unit {0} is unreachable")]
    Unreachable(String),

    #[error("Unit {unit} refused action {action}: {reason}")]
    Refused {
        unit: String,
        action: String,
        reason: String,
    },

    #[error("Unknown action receipt: {0}")]
    UnknownReceipt(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors raised while reading a test-specification document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to parse test document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to decode test document: {0}")]
    Decode(String),

    #[error("Test '{test}' has invalid field {field}: {message}")]
    InvalidField {
        test: String,
        field: &'static str,
        message: String,
    },

    #[error("Invalid target '{0}': expected \"app\" or \"model:app\"")]
    InvalidTarget(String),

    #[error("Test names must be strings, got {0}")]
    InvalidName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::InsufficientUnits {
            application: "magpie".to_string(),
            available: 10,
            required: 100,
        };
        assert_eq!(
            err.to_string(),
            "Not enough units for magpie to execute test: 10 available, 100 required"
        );
        assert_eq!(err.kind(), "insufficient_units");

        let err = ValidationError::MissingParameter {
            action: "fio".to_string(),
            parameter: "operation".to_string(),
        };
        assert_eq!(err.to_string(), "Action fio requires parameter operation");
    }

    #[test]
    fn test_dispatch_error_display() {
        let err = DispatchError::Unreachable("magpie/3".to_string());
        assert_eq!(err.to_string(), "Unit magpie/3 is unreachable");
    }
}
