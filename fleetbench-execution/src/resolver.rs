//! Target resolution against a fleet session

use fleetbench_core::{TargetDescriptor, TargetGroup, ValidationError};
use fleetbench_interfaces::FleetSession;
use std::sync::Arc;
use tracing::debug;

/// Resolves target descriptors into concrete unit groups.
///
/// Resolving a target with a model component switches the session's
/// active model and leaves it switched.
#[derive(Clone)]
pub struct TargetResolver {
    session: Arc<dyn FleetSession>,
}

impl TargetResolver {
    pub fn new(session: Arc<dyn FleetSession>) -> Self {
        Self { session }
    }

    pub async fn resolve(&self, target: &TargetDescriptor) -> Result<TargetGroup, ValidationError> {
        if let Some(model) = target.model_name() {
            self.session
                .switch_model(model)
                .await
                .map_err(|e| ValidationError::UnknownModel {
                    model: model.to_string(),
                    reason: e.to_string(),
                })?;
        }

        let application = self
            .session
            .get_application(target.app_name())
            .await
            .map_err(|e| ValidationError::UnknownApplication {
                application: target.app_name().to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            target = %target,
            units = application.units.len(),
            "Resolved target"
        );

        Ok(TargetGroup {
            model_name: target
                .model_name()
                .map(str::to_string)
                .or(application.model),
            app_name: application.name,
            units: application.units,
            actions: application.actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fleetbench_core::{ActionCatalog, ActionSchema, UnitRef};
    use fleetbench_interfaces::{Application, FleetError};
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Session {}

        #[async_trait]
        impl FleetSession for Session {
            async fn switch_model(&self, model: &str) -> Result<(), FleetError>;
            async fn get_application(&self, name: &str) -> Result<Application, FleetError>;
        }
    }

    fn magpie(model: Option<&str>) -> Application {
        let mut actions = ActionCatalog::new();
        actions.insert("fio".to_string(), ActionSchema::requiring(["operation"]));
        Application {
            name: "magpie".to_string(),
            model: model.map(str::to_string),
            units: (0..3).map(|i| UnitRef::numbered("magpie", i)).collect(),
            actions,
        }
    }

    #[tokio::test]
    async fn test_resolve_in_current_model() {
        let mut session = MockSession::new();
        session.expect_switch_model().never();
        session
            .expect_get_application()
            .with(eq("magpie"))
            .times(1)
            .returning(|_| Ok(magpie(Some("woodpecker"))));

        let resolver = TargetResolver::new(Arc::new(session));
        let group = resolver
            .resolve(&"magpie".parse().unwrap())
            .await
            .unwrap();

        assert_eq!(group.model_name.as_deref(), Some("woodpecker"));
        assert_eq!(group.app_name, "magpie");
        assert_eq!(group.unit_count(), 3);
        assert_eq!(group.units[0], UnitRef::from("magpie/0"));
        assert!(group.offers("fio").is_some());
    }

    #[tokio::test]
    async fn test_resolve_switches_model_first() {
        let mut seq = mockall::Sequence::new();
        let mut session = MockSession::new();
        session
            .expect_switch_model()
            .with(eq("woodpecker"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        session
            .expect_get_application()
            .with(eq("magpie"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(magpie(None)));

        let resolver = TargetResolver::new(Arc::new(session));
        let group = resolver
            .resolve(&TargetDescriptor::in_model("woodpecker", "magpie"))
            .await
            .unwrap();
        assert_eq!(group.model_name.as_deref(), Some("woodpecker"));
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let mut session = MockSession::new();
        session
            .expect_switch_model()
            .returning(|model| Err(FleetError::ModelNotFound(model.to_string())));
        session.expect_get_application().never();

        let resolver = TargetResolver::new(Arc::new(session));
        let err = resolver
            .resolve(&"heron:magpie".parse().unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "unknown_model");
        assert!(matches!(err, ValidationError::UnknownModel { ref model, .. } if model == "heron"));
    }

    #[tokio::test]
    async fn test_unknown_application() {
        let mut session = MockSession::new();
        session
            .expect_get_application()
            .returning(|name| Err(FleetError::ApplicationNotFound(name.to_string())));

        let resolver = TargetResolver::new(Arc::new(session));
        let err = resolver
            .resolve(&"egret".parse().unwrap())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ValidationError::UnknownApplication { ref application, .. } if application == "egret"
        ));
    }
}
