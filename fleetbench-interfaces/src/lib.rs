//! # Fleetbench Interfaces
//!
//! Interfaces the benchmark engine requires from its environment. The
//! fleet-management layer that owns the deployed units, the action
//! backend, and the timer used for ramp scheduling are all external
//! collaborators; this crate only describes the capability surface the
//! engine consumes so implementations can be swapped freely.
//!
//! ## Main Interfaces
//!
//! - [`FleetSession`] - model switching and application lookup
//! - [`ActionDispatcher`] - submit an action to one unit and poll its status
//! - [`Clock`] - monotonic time and sleeping, injectable for tests

pub mod clock;
pub mod dispatch;
pub mod fleet;

// Re-export commonly used types
pub use clock::{deadline_after, Clock, TokioClock};
pub use dispatch::{ActionDispatcher, ActionReport, DispatchReceipt};
pub use fleet::{Application, FleetError, FleetSession};
