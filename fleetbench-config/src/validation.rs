//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(url, field_name, domain)?;

    url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_string() {
        assert!(validate_required_string("prometheus", "type", "datasource").is_ok());
        assert!(validate_required_string("", "type", "datasource").is_err());
        assert!(validate_required_string("   ", "type", "datasource").is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1usize, "max_concurrent_dispatch", "execution").is_ok());
        let err = validate_positive(0usize, "max_concurrent_dispatch", "execution").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid execution configuration: max_concurrent_dispatch must be greater than 0, got 0"
        );
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("http://prometheus:9090", "url", "datasource").is_ok());
        assert!(validate_url("not a url", "url", "datasource").is_err());
        assert!(validate_url("", "url", "datasource").is_err());
    }
}
