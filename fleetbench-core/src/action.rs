//! Action domain model and lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::target::UnitRef;

/// Unique identifier for a tracked action (newtype pattern for type safety)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    /// Create a new random action ID
    pub fn new() -> Self {
        ActionId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Action status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Submitted to the unit, not yet started
    Pending,
    /// Running on the unit
    Running,
    /// Completed successfully
    Succeeded,
    /// Failed to dispatch or failed on the unit
    Failed,
    /// Did not finish before the run deadline
    TimedOut,
    /// Cancelled on the unit
    Cancelled,
}

impl ActionStatus {
    /// Check if the action is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ActionStatus::Succeeded
                | ActionStatus::Failed
                | ActionStatus::TimedOut
                | ActionStatus::Cancelled
        )
    }

    /// Whether this outcome counts against the run
    pub fn is_failure(&self) -> bool {
        matches!(self, ActionStatus::Failed | ActionStatus::TimedOut)
    }

    /// Statuses only move forward: pending, then running, then one terminal state
    pub fn can_transition_to(&self, next: ActionStatus) -> bool {
        next.rank() > self.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            ActionStatus::Pending => 0,
            ActionStatus::Running => 1,
            _ => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Running => "running",
            ActionStatus::Succeeded => "succeeded",
            ActionStatus::Failed => "failed",
            ActionStatus::TimedOut => "timed_out",
            ActionStatus::Cancelled => "cancelled",
        }
    }

    pub fn all() -> &'static [ActionStatus] {
        &[
            ActionStatus::Pending,
            ActionStatus::Running,
            ActionStatus::Succeeded,
            ActionStatus::Failed,
            ActionStatus::TimedOut,
            ActionStatus::Cancelled,
        ]
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dispatched unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub unit: UnitRef,
    /// Token handed back by the dispatcher, absent if dispatch failed
    pub receipt: Option<String>,
    pub status: ActionStatus,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<JsonValue>,
    pub error: Option<String>,
}

impl Action {
    /// A freshly submitted action
    pub fn pending(unit: UnitRef, receipt: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: ActionId::new(),
            unit,
            receipt: Some(receipt.into()),
            status: ActionStatus::Pending,
            submitted_at,
            completed_at: None,
            result: None,
            error: None,
        }
    }

    /// An action whose dispatch was refused; it is terminal from the start
    pub fn dispatch_failed(unit: UnitRef, error: &DispatchError, at: DateTime<Utc>) -> Self {
        Self {
            id: ActionId::new(),
            unit,
            receipt: None,
            status: ActionStatus::Failed,
            submitted_at: at,
            completed_at: Some(at),
            result: None,
            error: Some(error.to_string()),
        }
    }

    /// Move to `next` if that is a forward transition. Returns whether the
    /// status changed; a terminal action never changes again.
    pub fn advance(&mut self, next: ActionStatus, at: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(at);
        }
        true
    }

    /// Record a terminal outcome together with its payload
    pub fn finish(
        &mut self,
        status: ActionStatus,
        result: Option<JsonValue>,
        error: Option<String>,
        at: DateTime<Utc>,
    ) -> bool {
        if !status.is_terminal() || !self.advance(status, at) {
            return false;
        }
        self.result = result;
        self.error = error;
        true
    }

    /// Force a still-outstanding action to `TimedOut`
    pub fn time_out(&mut self, at: DateTime<Utc>) -> bool {
        self.finish(
            ActionStatus::TimedOut,
            None,
            Some("action did not complete before the run deadline".to_string()),
            at,
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_status() {
        assert!(ActionStatus::Succeeded.is_terminal());
        assert!(ActionStatus::Failed.is_terminal());
        assert!(ActionStatus::TimedOut.is_terminal());
        assert!(ActionStatus::Cancelled.is_terminal());
        assert!(!ActionStatus::Pending.is_terminal());
        assert!(!ActionStatus::Running.is_terminal());

        assert!(ActionStatus::Pending.can_transition_to(ActionStatus::Running));
        assert!(ActionStatus::Pending.can_transition_to(ActionStatus::Succeeded));
        assert!(!ActionStatus::Running.can_transition_to(ActionStatus::Pending));
        assert!(!ActionStatus::Failed.can_transition_to(ActionStatus::Succeeded));
        assert!(!ActionStatus::Running.can_transition_to(ActionStatus::Running));
    }

    #[test]
    fn test_action_lifecycle() {
        let now = Utc::now();
        let mut action = Action::pending(UnitRef::from("magpie/0"), "receipt-1", now);
        assert_eq!(action.status, ActionStatus::Pending);
        assert!(action.completed_at.is_none());

        assert!(action.advance(ActionStatus::Running, now));
        assert!(!action.advance(ActionStatus::Pending, now));
        assert_eq!(action.status, ActionStatus::Running);

        assert!(action.finish(ActionStatus::Succeeded, Some(json!({"iops": 1200})), None, now));
        assert!(action.completed_at.is_some());

        // At most one terminal transition
        assert!(!action.time_out(now));
        assert!(!action.finish(ActionStatus::Failed, None, Some("late".to_string()), now));
        assert_eq!(action.status, ActionStatus::Succeeded);
        assert_eq!(action.result, Some(json!({"iops": 1200})));
        assert!(action.error.is_none());
    }

    #[test]
    fn test_dispatch_failed_action_is_terminal() {
        let err = DispatchError::Unreachable("magpie/1".to_string());
        let action = Action::dispatch_failed(UnitRef::from("magpie/1"), &err, Utc::now());
        assert!(action.is_terminal());
        assert_eq!(action.status, ActionStatus::Failed);
        assert!(action.receipt.is_none());
        assert_eq!(action.error.as_deref(), Some("Unit magpie/1 is unreachable"));
    }

    #[test]
    fn test_finish_rejects_non_terminal_status() {
        let mut action = Action::pending(UnitRef::from("magpie/0"), "r", Utc::now());
        assert!(!action.finish(ActionStatus::Running, None, None, Utc::now()));
        assert_eq!(action.status, ActionStatus::Pending);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ActionStatus::TimedOut).unwrap();
        assert_eq!(json, "\"timed_out\"");
    }
}
