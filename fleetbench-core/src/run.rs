//! Benchmark run status and summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::action::{Action, ActionStatus};
use crate::target::UnitRef;
use crate::utils::serde_duration_secs_f64;

/// Status of a benchmark run
///
/// `Validating -> Ramping -> AwaitingCompletion -> {Completed | Failed}`,
/// and any non-terminal state may move to `Aborted` on external
/// cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Validating,
    Ramping,
    AwaitingCompletion,
    Completed,
    Failed,
    Aborted,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Aborted
        )
    }

    /// Whether the run state machine allows moving to `next`
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        use RunStatus::*;
        match (self, next) {
            (current, Aborted) => !current.is_terminal(),
            (Validating, Ramping) => true,
            (Ramping, AwaitingCompletion) => true,
            (AwaitingCompletion, Completed) | (AwaitingCompletion, Failed) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Validating => "validating",
            RunStatus::Ramping => "ramping",
            RunStatus::AwaitingCompletion => "awaiting_completion",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRunSummary {
    pub test_name: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Wall-clock duration measured on the run's monotonic clock
    #[serde(with = "serde_duration_secs_f64")]
    pub duration: Duration,
    pub counts: BTreeMap<ActionStatus, usize>,
    /// Units whose action failed or timed out
    pub failed_units: Vec<UnitRef>,
    pub batches_planned: usize,
    pub batches_submitted: usize,
}

impl BenchmarkRunSummary {
    /// Count of actions that finished in `status`
    pub fn count(&self, status: ActionStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Total number of tracked actions
    pub fn total_actions(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Per-status counts and failed units for a set of actions
pub fn tally<'a, I>(actions: I) -> (BTreeMap<ActionStatus, usize>, Vec<UnitRef>)
where
    I: IntoIterator<Item = &'a Action>,
{
    let mut counts: BTreeMap<ActionStatus, usize> =
        ActionStatus::all().iter().map(|status| (*status, 0)).collect();
    let mut failed_units = Vec::new();

    for action in actions {
        *counts.entry(action.status).or_insert(0) += 1;
        if action.status.is_failure() {
            failed_units.push(action.unit.clone());
        }
    }

    (counts, failed_units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;

    #[test]
    fn test_run_state_machine() {
        use RunStatus::*;
        assert!(Validating.can_transition_to(Ramping));
        assert!(Ramping.can_transition_to(AwaitingCompletion));
        assert!(AwaitingCompletion.can_transition_to(Completed));
        assert!(AwaitingCompletion.can_transition_to(Failed));
        assert!(Validating.can_transition_to(Aborted));
        assert!(Ramping.can_transition_to(Aborted));

        assert!(!Validating.can_transition_to(AwaitingCompletion));
        assert!(!Ramping.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Aborted));
        assert!(!Aborted.can_transition_to(Completed));
    }

    #[test]
    fn test_tally() {
        let now = Utc::now();
        let mut ok = Action::pending(UnitRef::from("a/0"), "r0", now);
        ok.finish(ActionStatus::Succeeded, None, None, now);
        let mut slow = Action::pending(UnitRef::from("a/1"), "r1", now);
        slow.time_out(now);
        let failed = Action::dispatch_failed(
            UnitRef::from("a/2"),
            &DispatchError::Unreachable("a/2".to_string()),
            now,
        );

        let actions = vec![ok, slow, failed];
        let (counts, failed_units) = tally(&actions);
        assert_eq!(counts[&ActionStatus::Succeeded], 1);
        assert_eq!(counts[&ActionStatus::TimedOut], 1);
        assert_eq!(counts[&ActionStatus::Failed], 1);
        assert_eq!(counts[&ActionStatus::Pending], 0);
        assert_eq!(failed_units, vec![UnitRef::from("a/1"), UnitRef::from("a/2")]);
    }
}
