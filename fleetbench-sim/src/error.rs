use thiserror::Error;

/// Errors raised while loading a fleet description
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Failed to read fleet file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse fleet file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid fleet description: {0}")]
    Invalid(String),
}
