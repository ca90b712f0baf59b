//! Running every test of a document

use fleetbench_config::{DatasourceConfig, FleetbenchConfig};
use fleetbench_core::{BatchPlan, BenchmarkRunSummary, TargetGroup, TestDocument, ValidationError};
use fleetbench_interfaces::{ActionDispatcher, FleetSession};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{BenchmarkError, BenchmarkResult};
use crate::runner::BenchmarkRunner;

/// What happened to one named test
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    /// The test ran; the summary may still contain failed actions
    Ran(BenchmarkRunSummary),
    /// The test was rejected before anything was dispatched
    Invalid(ValidationError),
}

impl TestOutcome {
    pub fn summary(&self) -> Option<&BenchmarkRunSummary> {
        match self {
            TestOutcome::Ran(summary) => Some(summary),
            TestOutcome::Invalid(_) => None,
        }
    }

    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            TestOutcome::Ran(_) => None,
            TestOutcome::Invalid(e) => Some(e),
        }
    }
}

#[derive(serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum OutcomeRepr<'a> {
    Ran(&'a BenchmarkRunSummary),
    Invalid { kind: &'static str, error: String },
}

impl Serialize for TestOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TestOutcome::Ran(summary) => OutcomeRepr::Ran(summary).serialize(serializer),
            TestOutcome::Invalid(e) => OutcomeRepr::Invalid {
                kind: e.kind(),
                error: e.to_string(),
            }
            .serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedOutcome {
    pub name: String,
    pub outcome: TestOutcome,
}

/// Per-test outcomes of one invocation, in document order.
///
/// Tests after a validation failure or an abort are absent: they were
/// never started.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<NamedOutcome>,
    pub aborted: bool,
}

impl RunReport {
    pub fn get(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes
            .iter()
            .find(|named| named.name == name)
            .map(|named| &named.outcome)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// The test that stopped the invocation, if any failed validation
    pub fn validation_failure(&self) -> Option<(&str, &ValidationError)> {
        self.outcomes.iter().find_map(|named| {
            named
                .outcome
                .validation_error()
                .map(|e| (named.name.as_str(), e))
        })
    }

    pub fn summaries(&self) -> impl Iterator<Item = &BenchmarkRunSummary> + '_ {
        self.outcomes.iter().filter_map(|named| named.outcome.summary())
    }
}

/// Serialises as a mapping from test name to outcome
impl Serialize for RunReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.outcomes.len()))?;
        for named in &self.outcomes {
            map.serialize_entry(&named.name, &named.outcome)?;
        }
        map.end()
    }
}

/// Runs the tests of a document one after another
pub struct BenchmarkOrchestrator {
    runner: BenchmarkRunner,
    datasource: Option<DatasourceConfig>,
}

impl BenchmarkOrchestrator {
    pub fn new(runner: BenchmarkRunner, datasource: Option<DatasourceConfig>) -> Self {
        Self { runner, datasource }
    }

    /// Build an orchestrator from a full configuration, validating it first
    pub fn from_config(
        session: Arc<dyn FleetSession>,
        dispatcher: Arc<dyn ActionDispatcher>,
        config: &FleetbenchConfig,
    ) -> BenchmarkResult<Self> {
        config.validate_all()?;
        let runner = BenchmarkRunner::new(session, dispatcher, config.execution.clone());
        Ok(Self::new(runner, config.datasource.clone()))
    }

    /// Replace the runner's abort signal
    pub fn with_abort_signal(mut self, abort: fleetbench_resilience::AbortSignal) -> Self {
        self.runner = self.runner.with_abort_signal(abort);
        self
    }

    /// Parse a test document as delivered by the caller, optionally
    /// base64-wrapped
    pub fn parse_document(content: &str, base64: bool) -> BenchmarkResult<TestDocument> {
        let document = if base64 {
            TestDocument::from_base64_yaml(content)?
        } else {
            TestDocument::from_yaml_str(content)?
        };
        Ok(document)
    }

    pub fn runner(&self) -> &BenchmarkRunner {
        &self.runner
    }

    /// Run every test in document order.
    ///
    /// The first validation failure ends the invocation, as does an abort;
    /// either way the report holds everything that happened up to then.
    pub async fn run_all(&self, document: &TestDocument) -> BenchmarkResult<RunReport> {
        self.check_datasource()?;

        let abort = self.runner.abort_signal();
        let mut report = RunReport::default();

        for spec in document {
            if abort.is_aborted() {
                warn!(test = %spec.name, "Abort requested, not starting remaining tests");
                report.aborted = true;
                break;
            }

            match self.runner.run(spec).await {
                Ok(summary) => {
                    report.outcomes.push(NamedOutcome {
                        name: spec.name.clone(),
                        outcome: TestOutcome::Ran(summary),
                    });
                }
                Err(BenchmarkError::Validation { test, source }) => {
                    error!(test = %test, kind = source.kind(), error = %source, "Test failed validation");
                    report.outcomes.push(NamedOutcome {
                        name: test,
                        outcome: TestOutcome::Invalid(source),
                    });
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if abort.is_aborted() {
            report.aborted = true;
        }

        info!(
            tests = document.len(),
            reported = report.len(),
            aborted = report.aborted,
            "Benchmark invocation finished"
        );
        Ok(report)
    }

    /// Validate every test without dispatching anything. Unlike
    /// [`run_all`](Self::run_all) this does not stop at the first failure.
    pub async fn validate_all(
        &self,
        document: &TestDocument,
    ) -> Vec<(String, Result<TargetGroup, ValidationError>)> {
        let mut results = Vec::with_capacity(document.len());
        for spec in document {
            let result = self.runner.validator().validate(spec).await;
            results.push((spec.name.clone(), result));
        }
        results
    }

    /// Validate and plan every test without dispatching anything.
    ///
    /// Every test of the document gets an entry; an error other than a
    /// validation failure ends the dry run.
    pub async fn plan_all(
        &self,
        document: &TestDocument,
    ) -> BenchmarkResult<Vec<(String, Result<BatchPlan, ValidationError>)>> {
        let mut results = Vec::with_capacity(document.len());
        for spec in document {
            let result = match self.runner.plan(spec).await {
                Ok((_, plan)) => Ok(plan),
                Err(BenchmarkError::Validation { source, .. }) => Err(source),
                Err(e) => {
                    error!(test = %spec.name, error = %e, "Planning failed");
                    return Err(e);
                }
            };
            results.push((spec.name.clone(), result));
        }
        Ok(results)
    }

    fn check_datasource(&self) -> BenchmarkResult<()> {
        if self.runner.config().require_datasource && self.datasource.is_none() {
            return Err(BenchmarkError::MissingDatasource);
        }
        if let Some(datasource) = &self.datasource {
            info!(kind = %datasource.kind, url = %datasource.url, "Using datasource");
        }
        Ok(())
    }
}
