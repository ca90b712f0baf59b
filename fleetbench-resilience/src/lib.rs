//! Resilience patterns for Fleetbench
//!
//! This crate provides external cancellation of in-flight runs and the
//! backoff calculation behind the shared polling cadence.

pub mod abort;
pub mod backoff;

// Re-export commonly used types
pub use abort::{AbortCoordinator, AbortError, AbortSignal};
pub use backoff::{BackoffCalculator, BackoffStrategy, PollCadence};
