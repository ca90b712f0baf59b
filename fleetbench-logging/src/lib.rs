//! Logging setup for Fleetbench
//!
//! Library crates emit events through `tracing` (or `log`, which the
//! subscriber bridges). Only binaries call into this crate, once, at
//! startup.

pub mod init;

pub use init::{build_env_filter, filter_directives, init_logging_from_config, init_simple_tracing};
