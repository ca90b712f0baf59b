//! Domain-driven configuration management for Fleetbench
//!
//! Configuration is an explicit value handed to the benchmark engine at
//! construction; nothing here is process-global. It is split by
//! functional domain, with validation, defaults, and environment
//! variable overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    datasource::DatasourceConfig, execution::ExecutionConfig, logging::LoggingConfig,
    FleetbenchConfig,
};
