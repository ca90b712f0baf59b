//! Fleetbench Execution Engine
//!
//! Turns a test document into benchmark runs against a fleet:
//!
//! - [`TargetResolver`] resolves `"app"` / `"model:app"` targets into units
//! - [`SpecValidator`] checks a test can run on the resolved units
//! - [`BatchScheduler`] splits the client ramp into timed batches
//! - [`ActionPool`] dispatches batches and tracks every action to a
//!   terminal state
//! - [`BenchmarkRunner`] drives one run from validation to summary
//! - [`BenchmarkOrchestrator`] runs every test of a document in order

pub mod error;
pub mod orchestrator;
pub mod pool;
pub mod resolver;
pub mod runner;
pub mod scheduler;
pub mod validator;

// Re-export main types
pub use error::{BenchmarkError, BenchmarkResult};
pub use orchestrator::{BenchmarkOrchestrator, NamedOutcome, RunReport, TestOutcome};
pub use pool::ActionPool;
pub use resolver::TargetResolver;
pub use runner::BenchmarkRunner;
pub use scheduler::BatchScheduler;
pub use validator::SpecValidator;
