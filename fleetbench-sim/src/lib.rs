//! # Fleetbench Sim
//!
//! A simulated fleet that implements both [`FleetSession`] and
//! [`ActionDispatcher`] in memory. Models, applications, their units and
//! the behaviour of every action come from a small YAML fleet file, so
//! test documents can be dry-run without a real deployment.
//!
//! Action progress is measured on tokio's clock, which makes the fleet
//! deterministic under paused time.
//!
//! [`FleetSession`]: fleetbench_interfaces::FleetSession
//! [`ActionDispatcher`]: fleetbench_interfaces::ActionDispatcher

pub mod error;
pub mod fleet;
pub mod spec;

pub use error::SimError;
pub use fleet::SimulatedFleet;
pub use spec::{ApplicationSpec, FleetSpec, ModelSpec, Outcome, SimActionSpec};
