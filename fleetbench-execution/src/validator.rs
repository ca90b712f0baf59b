//! Feasibility checks for a test against the resolved fleet

use fleetbench_core::{TargetGroup, TestSpec, ValidationError};
use tracing::debug;

use crate::resolver::TargetResolver;

/// Checks that a test spec can run on its target.
///
/// Apart from the model switch done by target resolution, validation
/// does not touch fleet state, so validating the same spec twice against
/// an unchanged fleet gives the same answer.
#[derive(Clone)]
pub struct SpecValidator {
    resolver: TargetResolver,
}

impl SpecValidator {
    pub fn new(resolver: TargetResolver) -> Self {
        Self { resolver }
    }

    pub async fn validate(&self, spec: &TestSpec) -> Result<TargetGroup, ValidationError> {
        let group = self.resolver.resolve(&spec.target).await?;

        if group.unit_count() < spec.clients {
            return Err(ValidationError::InsufficientUnits {
                application: group.app_name.clone(),
                available: group.unit_count(),
                required: spec.clients,
            });
        }

        let schema = group
            .offers(&spec.action)
            .ok_or_else(|| ValidationError::UnknownAction {
                application: group.app_name.clone(),
                action: spec.action.clone(),
            })?;

        if let Some(missing) = schema
            .required_parameters()
            .into_iter()
            .find(|name| !spec.parameters.contains_key(*name))
        {
            return Err(ValidationError::MissingParameter {
                action: spec.action.clone(),
                parameter: missing.to_string(),
            });
        }

        debug!(test = %spec.name, target = %spec.target, "Test spec is valid");
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetbench_core::{Parameters, TargetDescriptor};
    use fleetbench_sim::{ApplicationSpec, FleetSpec, SimActionSpec, SimulatedFleet};
    use serde_json::json;
    use std::sync::Arc;

    fn validator(units: usize) -> SpecValidator {
        let fleet = SimulatedFleet::new(FleetSpec::new("woodpecker").with_application(
            "woodpecker",
            "magpie",
            ApplicationSpec::new(units)
                .with_action("fio", SimActionSpec::new().requiring(["operation", "iodepth"])),
        ));
        SpecValidator::new(TargetResolver::new(Arc::new(fleet)))
    }

    fn spec(clients: usize, action: &str, parameters: serde_json::Value) -> TestSpec {
        let parameters: Parameters = serde_json::from_value(parameters).unwrap();
        TestSpec::builder("readwrite", TargetDescriptor::application("magpie"), action)
            .clients(clients)
            .batch_size(clients)
            .parameters(parameters)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_spec_returns_group() {
        let group = validator(5)
            .validate(&spec(5, "fio", json!({"operation": "randrw", "iodepth": 32})))
            .await
            .unwrap();
        assert_eq!(group.unit_count(), 5);
    }

    #[tokio::test]
    async fn test_insufficient_units() {
        let err = validator(10)
            .validate(&spec(100, "fio", json!({"operation": "randrw", "iodepth": 32})))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InsufficientUnits {
                application: "magpie".to_string(),
                available: 10,
                required: 100,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let err = validator(5)
            .validate(&spec(1, "stress-ng", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unknown_action");
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let err = validator(5)
            .validate(&spec(1, "fio", json!({"operation": "randrw"})))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingParameter {
                action: "fio".to_string(),
                parameter: "iodepth".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_validation_is_idempotent() {
        let validator = validator(3);
        let ok = spec(3, "fio", json!({"operation": "read", "iodepth": 1}));
        assert_eq!(validator.validate(&ok).await, validator.validate(&ok).await);

        let bad = spec(4, "fio", json!({"operation": "read", "iodepth": 1}));
        assert_eq!(validator.validate(&bad).await, validator.validate(&bad).await);
    }
}
