//! Action dispatcher interface definitions
//!
//! The dispatcher is owned by the fleet-management layer. The engine
//! treats it as a black box: it submits one action to one unit and later
//! polls the returned receipt for status. No retry policy is applied to
//! submission.

use async_trait::async_trait;
use fleetbench_core::{ActionStatus, DispatchError, Parameters, UnitRef};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Opaque token identifying a submitted action to its dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchReceipt(pub String);

impl DispatchReceipt {
    pub fn new(token: impl Into<String>) -> Self {
        DispatchReceipt(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DispatchReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status snapshot returned by a poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    pub status: ActionStatus,
    pub result: Option<JsonValue>,
    pub error: Option<String>,
}

impl ActionReport {
    pub fn pending() -> Self {
        Self::with_status(ActionStatus::Pending)
    }

    pub fn running() -> Self {
        Self::with_status(ActionStatus::Running)
    }

    pub fn succeeded(result: Option<JsonValue>) -> Self {
        Self {
            status: ActionStatus::Succeeded,
            result,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Failed,
            result: None,
            error: Some(error.into()),
        }
    }

    fn with_status(status: ActionStatus) -> Self {
        Self {
            status,
            result: None,
            error: None,
        }
    }
}

/// Submits actions to single units and reports their status
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    /// Queue `action` on `unit`. Fails if the unit is unreachable or
    /// refuses the action.
    async fn submit(
        &self,
        unit: &UnitRef,
        action: &str,
        parameters: &Parameters,
    ) -> Result<DispatchReceipt, DispatchError>;

    /// Non-blocking status check for a previously submitted action
    async fn poll(&self, receipt: &DispatchReceipt) -> Result<ActionReport, DispatchError>;
}
