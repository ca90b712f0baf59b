//! Fleet description format
//!
//! ```yaml
//! default_model: woodpecker
//! models:
//!   woodpecker:
//!     applications:
//!       magpie:
//!         units: 20
//!         unreachable_units: [7]
//!         actions:
//!           fio:
//!             description: Run a fio workload
//!             required: [operation]
//!             completes_after: 45s
//!             outcome: succeeded
//! ```

use fleetbench_core::{ActionCatalog, ActionSchema, UnitRef};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::SimError;

/// Terminal state a simulated action settles in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Succeeded,
    Failed,
    Cancelled,
}

/// Behaviour of one action offered by an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimActionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameters the action cannot run without
    #[serde(default)]
    pub required: Vec<String>,

    /// Time from submission until the action settles
    #[serde(default, with = "humantime_serde")]
    pub completes_after: Duration,

    #[serde(default)]
    pub outcome: Outcome,

    /// Unit indices on which the action fails regardless of `outcome`
    #[serde(default)]
    pub failing_units: Vec<usize>,

    /// Never settle; polls keep reporting the action as running
    #[serde(default)]
    pub hang: bool,

    /// Result payload reported on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
}

impl Default for SimActionSpec {
    fn default() -> Self {
        Self {
            description: None,
            required: Vec::new(),
            completes_after: Duration::ZERO,
            outcome: Outcome::Succeeded,
            failing_units: Vec::new(),
            hang: false,
            result: None,
        }
    }
}

impl SimActionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requiring<I, S>(mut self, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = required.into_iter().map(Into::into).collect();
        self
    }

    pub fn completes_after(mut self, delay: Duration) -> Self {
        self.completes_after = delay;
        self
    }

    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn failing_on<I: IntoIterator<Item = usize>>(mut self, units: I) -> Self {
        self.failing_units = units.into_iter().collect();
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn with_result(mut self, result: JsonValue) -> Self {
        self.result = Some(result);
        self
    }

    /// Declared interface as seen through a fleet session
    pub fn schema(&self) -> ActionSchema {
        let mut schema = ActionSchema::requiring(self.required.iter().cloned());
        schema.description = self.description.clone();
        schema
    }
}

/// One deployed application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSpec {
    /// Number of units, named `<app>/0 .. <app>/<units - 1>`
    pub units: usize,

    /// Unit indices that refuse every submission
    #[serde(default)]
    pub unreachable_units: Vec<usize>,

    #[serde(default)]
    pub actions: BTreeMap<String, SimActionSpec>,
}

impl ApplicationSpec {
    pub fn new(units: usize) -> Self {
        Self {
            units,
            ..Default::default()
        }
    }

    pub fn with_action(mut self, name: impl Into<String>, action: SimActionSpec) -> Self {
        self.actions.insert(name.into(), action);
        self
    }

    pub fn unreachable<I: IntoIterator<Item = usize>>(mut self, units: I) -> Self {
        self.unreachable_units = units.into_iter().collect();
        self
    }

    pub fn unit_refs(&self, name: &str) -> Vec<UnitRef> {
        (0..self.units).map(|i| UnitRef::numbered(name, i)).collect()
    }

    pub fn catalog(&self) -> ActionCatalog {
        self.actions
            .iter()
            .map(|(name, action)| (name.clone(), action.schema()))
            .collect()
    }
}

/// One model and the applications deployed in it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default)]
    pub applications: BTreeMap<String, ApplicationSpec>,
}

/// Complete fleet description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSpec {
    /// Model active when a session starts
    pub default_model: String,
    pub models: BTreeMap<String, ModelSpec>,
}

impl FleetSpec {
    /// A fleet with one empty model, active by default
    pub fn new(default_model: impl Into<String>) -> Self {
        let default_model = default_model.into();
        let mut models = BTreeMap::new();
        models.insert(default_model.clone(), ModelSpec::default());
        Self {
            default_model,
            models,
        }
    }

    /// Add an application to `model`, creating the model if needed
    pub fn with_application(
        mut self,
        model: impl Into<String>,
        name: impl Into<String>,
        application: ApplicationSpec,
    ) -> Self {
        self.models
            .entry(model.into())
            .or_default()
            .applications
            .insert(name.into(), application);
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SimError> {
        let spec: FleetSpec = serde_yaml::from_str(yaml)?;
        spec.check()?;
        Ok(spec)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    fn check(&self) -> Result<(), SimError> {
        if !self.models.contains_key(&self.default_model) {
            return Err(SimError::Invalid(format!(
                "default model '{}' is not defined",
                self.default_model
            )));
        }

        for (model_name, model) in &self.models {
            for (app_name, app) in &model.applications {
                if let Some(index) = app
                    .unreachable_units
                    .iter()
                    .find(|index| **index >= app.units)
                {
                    return Err(SimError::Invalid(format!(
                        "{}:{} has no unit {}",
                        model_name, app_name, index
                    )));
                }
            }
        }

        Ok(())
    }
}
