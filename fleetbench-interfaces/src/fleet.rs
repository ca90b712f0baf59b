//! Fleet session interface definitions
//!
//! A fleet session is a stateful handle onto the fleet-management
//! system. Switching model changes the session's active context for all
//! subsequent lookups; callers must not assume the previous model is
//! restored afterwards.

use async_trait::async_trait;
use fleetbench_core::{ActionCatalog, UnitRef};
use serde::{Deserialize, Serialize};

/// Errors reported by a fleet session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FleetError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    #[error("Fleet session error: {0}")]
    Session(String),
}

/// An application as seen by the fleet session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    /// Model the application was found in, if the session reports it
    pub model: Option<String>,
    /// Units in a stable order
    pub units: Vec<UnitRef>,
    /// Actions the units offer
    pub actions: ActionCatalog,
}

/// Core fleet session interface
#[async_trait]
pub trait FleetSession: Send + Sync {
    /// Make `model` the active model for subsequent lookups
    async fn switch_model(&self, model: &str) -> Result<(), FleetError>;

    /// Look up an application in the active model
    async fn get_application(&self, name: &str) -> Result<Application, FleetError>;
}
