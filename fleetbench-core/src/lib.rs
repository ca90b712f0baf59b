//! Core domain models and types for Fleetbench
//!
//! This crate contains the fundamental types used throughout the
//! benchmark engine: test specifications, resolved targets, tracked
//! actions, batch plans and run summaries. It has minimal dependencies
//! and defines the domain language of the application.

pub mod action;
pub mod error;
pub mod plan;
pub mod run;
pub mod spec;
pub mod target;
pub mod utils;

// Re-export commonly used types at the crate root
pub use action::{Action, ActionId, ActionStatus};
pub use error::{DispatchError, DocumentError, ValidationError};
pub use plan::{Batch, BatchPlan};
pub use run::{BenchmarkRunSummary, RunStatus};
pub use spec::{Parameters, TargetDescriptor, TestDocument, TestSpec};
pub use target::{ActionCatalog, ActionSchema, TargetGroup, UnitRef};
