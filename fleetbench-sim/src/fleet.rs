//! In-memory fleet session and dispatcher

use async_trait::async_trait;
use fleetbench_core::{ActionStatus, DispatchError, Parameters, UnitRef};
use fleetbench_interfaces::{
    ActionDispatcher, ActionReport, Application, DispatchReceipt, FleetError, FleetSession,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use tokio::time::Instant;
use tracing::debug;

use crate::error::SimError;
use crate::spec::{ApplicationSpec, FleetSpec, Outcome, SimActionSpec};

#[derive(Debug)]
struct Submission {
    unit: UnitRef,
    action: SimActionSpec,
    unit_index: usize,
    submitted_at: Instant,
}

#[derive(Debug)]
struct SimState {
    active_model: String,
    next_receipt: u64,
    submissions: HashMap<DispatchReceipt, Submission>,
    polls: usize,
}

/// A fleet whose units and actions exist only in memory
#[derive(Debug)]
pub struct SimulatedFleet {
    spec: FleetSpec,
    state: Mutex<SimState>,
}

impl SimulatedFleet {
    pub fn new(spec: FleetSpec) -> Self {
        let state = SimState {
            active_model: spec.default_model.clone(),
            next_receipt: 0,
            submissions: HashMap::new(),
            polls: 0,
        };
        Self {
            spec,
            state: Mutex::new(state),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SimError> {
        Ok(Self::new(FleetSpec::from_yaml_str(yaml)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        Ok(Self::new(FleetSpec::from_file(path)?))
    }

    pub fn active_model(&self) -> String {
        self.state.lock().active_model.clone()
    }

    /// Number of accepted submissions so far
    pub fn submitted(&self) -> usize {
        self.state.lock().submissions.len()
    }

    /// Number of poll calls answered so far
    pub fn polls(&self) -> usize {
        self.state.lock().polls
    }

    /// Units that accepted a submission, in no particular order
    pub fn submitted_units(&self) -> Vec<UnitRef> {
        self.state
            .lock()
            .submissions
            .values()
            .map(|submission| submission.unit.clone())
            .collect()
    }

    /// Find the application owning `unit` in the active model
    fn locate(&self, model: &str, unit: &UnitRef) -> Option<(&ApplicationSpec, usize)> {
        let (app_name, index) = unit.as_str().rsplit_once('/')?;
        let index: usize = index.parse().ok()?;
        let app = self.spec.models.get(model)?.applications.get(app_name)?;
        (index < app.units).then_some((app, index))
    }

    fn report(submission: &Submission, now: Instant) -> ActionReport {
        let action = &submission.action;
        let elapsed = now.saturating_duration_since(submission.submitted_at);

        if action.hang || elapsed < action.completes_after {
            return if elapsed.is_zero() {
                ActionReport::pending()
            } else {
                ActionReport::running()
            };
        }

        if action.failing_units.contains(&submission.unit_index) {
            return ActionReport::failed(format!("action failed on {}", submission.unit));
        }

        match action.outcome {
            Outcome::Succeeded => ActionReport::succeeded(action.result.clone()),
            Outcome::Failed => ActionReport::failed(format!("action failed on {}", submission.unit)),
            Outcome::Cancelled => ActionReport {
                status: ActionStatus::Cancelled,
                result: None,
                error: Some(format!("action cancelled on {}", submission.unit)),
            },
        }
    }
}

#[async_trait]
impl FleetSession for SimulatedFleet {
    async fn switch_model(&self, model: &str) -> Result<(), FleetError> {
        if !self.spec.models.contains_key(model) {
            return Err(FleetError::ModelNotFound(model.to_string()));
        }
        debug!(model, "Switching active model");
        self.state.lock().active_model = model.to_string();
        Ok(())
    }

    async fn get_application(&self, name: &str) -> Result<Application, FleetError> {
        let model = self.active_model();
        let app = self
            .spec
            .models
            .get(&model)
            .and_then(|m| m.applications.get(name))
            .ok_or_else(|| FleetError::ApplicationNotFound(format!("{} in model {}", name, model)))?;

        Ok(Application {
            name: name.to_string(),
            model: Some(model),
            units: app.unit_refs(name),
            actions: app.catalog(),
        })
    }
}

#[async_trait]
impl ActionDispatcher for SimulatedFleet {
    async fn submit(
        &self,
        unit: &UnitRef,
        action: &str,
        parameters: &Parameters,
    ) -> Result<DispatchReceipt, DispatchError> {
        let mut state = self.state.lock();

        let (app, index) = self
            .locate(&state.active_model, unit)
            .ok_or_else(|| DispatchError::Unreachable(unit.to_string()))?;

        if app.unreachable_units.contains(&index) {
            return Err(DispatchError::Unreachable(unit.to_string()));
        }

        let spec = app.actions.get(action).ok_or_else(|| DispatchError::Refused {
            unit: unit.to_string(),
            action: action.to_string(),
            reason: "action not offered".to_string(),
        })?;

        if let Some(missing) = spec.required.iter().find(|p| !parameters.contains_key(*p)) {
            return Err(DispatchError::Refused {
                unit: unit.to_string(),
                action: action.to_string(),
                reason: format!("missing parameter {}", missing),
            });
        }

        state.next_receipt += 1;
        let receipt = DispatchReceipt::new(format!("sim-{}", state.next_receipt));
        state.submissions.insert(
            receipt.clone(),
            Submission {
                unit: unit.clone(),
                action: spec.clone(),
                unit_index: index,
                submitted_at: Instant::now(),
            },
        );

        debug!(unit = %unit, action, receipt = %receipt, "Accepted submission");
        Ok(receipt)
    }

    async fn poll(&self, receipt: &DispatchReceipt) -> Result<ActionReport, DispatchError> {
        let mut state = self.state.lock();
        state.polls += 1;
        let submission = state
            .submissions
            .get(receipt)
            .ok_or_else(|| DispatchError::UnknownReceipt(receipt.to_string()))?;
        Ok(Self::report(submission, Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fleet() -> SimulatedFleet {
        SimulatedFleet::new(
            FleetSpec::new("woodpecker")
                .with_application(
                    "woodpecker",
                    "magpie",
                    ApplicationSpec::new(3).unreachable([1]).with_action(
                        "fio",
                        SimActionSpec::new()
                            .requiring(["operation"])
                            .completes_after(Duration::from_secs(10))
                            .failing_on([2]),
                    ),
                )
                .with_application("heron", "egret", ApplicationSpec::new(1)),
        )
    }

    fn params() -> Parameters {
        let mut parameters = Parameters::new();
        parameters.insert("operation".to_string(), "randrw".into());
        parameters
    }

    #[tokio::test]
    async fn test_switch_model_and_lookup() {
        let fleet = fleet();
        assert!(fleet.get_application("egret").await.is_err());

        fleet.switch_model("heron").await.unwrap();
        let egret = fleet.get_application("egret").await.unwrap();
        assert_eq!(egret.model.as_deref(), Some("heron"));
        assert_eq!(egret.units, vec![UnitRef::from("egret/0")]);

        assert_eq!(
            fleet.switch_model("nowhere").await,
            Err(FleetError::ModelNotFound("nowhere".to_string()))
        );
        // A failed switch leaves the session where it was
        assert_eq!(fleet.active_model(), "heron");
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_progress() {
        let fleet = fleet();
        let receipt = fleet
            .submit(&UnitRef::from("magpie/0"), "fio", &params())
            .await
            .unwrap();
        assert_eq!(fleet.poll(&receipt).await.unwrap().status, ActionStatus::Pending);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fleet.poll(&receipt).await.unwrap().status, ActionStatus::Running);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fleet.poll(&receipt).await.unwrap().status, ActionStatus::Succeeded);
        assert_eq!(fleet.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_unit() {
        let fleet = fleet();
        let receipt = fleet
            .submit(&UnitRef::from("magpie/2"), "fio", &params())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let report = fleet.poll(&receipt).await.unwrap();
        assert_eq!(report.status, ActionStatus::Failed);
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_submission_refusals() {
        let fleet = fleet();

        let err = fleet
            .submit(&UnitRef::from("magpie/1"), "fio", &params())
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::Unreachable("magpie/1".to_string()));

        let err = fleet
            .submit(&UnitRef::from("magpie/0"), "fio", &Parameters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Refused { .. }));

        let err = fleet
            .submit(&UnitRef::from("magpie/0"), "stress", &params())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Refused { .. }));

        let err = fleet
            .submit(&UnitRef::from("magpie/9"), "fio", &params())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Unreachable(_)));

        assert_eq!(fleet.submitted(), 0);

        let err = fleet.poll(&DispatchReceipt::new("bogus")).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownReceipt(_)));
    }
}
