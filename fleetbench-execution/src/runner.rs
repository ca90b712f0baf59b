//! Single benchmark run coordination

use chrono::{DateTime, Utc};
use fleetbench_config::ExecutionConfig;
use fleetbench_core::{
    run::tally, ActionId, ActionStatus, BatchPlan, BenchmarkRunSummary, RunStatus, TargetGroup,
    TestSpec,
};
use fleetbench_interfaces::{deadline_after, ActionDispatcher, Clock, FleetSession, TokioClock};
use fleetbench_resilience::AbortSignal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{BenchmarkError, BenchmarkResult};
use crate::pool::ActionPool;
use crate::resolver::TargetResolver;
use crate::scheduler::BatchScheduler;
use crate::validator::SpecValidator;

/// State of one run while the runner drives it
struct BenchmarkRun<'a> {
    spec: &'a TestSpec,
    status: RunStatus,
    start_time: Option<DateTime<Utc>>,
    batches_submitted: usize,
}

impl<'a> BenchmarkRun<'a> {
    fn new(spec: &'a TestSpec) -> Self {
        Self {
            spec,
            status: RunStatus::Validating,
            start_time: None,
            batches_submitted: 0,
        }
    }

    fn transition(&mut self, next: RunStatus) {
        if self.status.can_transition_to(next) {
            debug!(test = %self.spec.name, from = %self.status, to = %next, "Run status changed");
            self.status = next;
        } else {
            warn!(test = %self.spec.name, from = %self.status, to = %next, "Ignoring invalid run transition");
        }
    }

    fn is_aborted(&self) -> bool {
        self.status == RunStatus::Aborted
    }
}

/// Drives one test from validation to a run summary.
///
/// A runner holds no per-run state, so one instance can execute any
/// number of runs, including concurrently.
#[derive(Clone)]
pub struct BenchmarkRunner {
    dispatcher: Arc<dyn ActionDispatcher>,
    clock: Arc<dyn Clock>,
    validator: SpecValidator,
    config: ExecutionConfig,
    abort: AbortSignal,
}

impl BenchmarkRunner {
    pub fn new(
        session: Arc<dyn FleetSession>,
        dispatcher: Arc<dyn ActionDispatcher>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            dispatcher,
            clock: Arc::new(TokioClock),
            validator: SpecValidator::new(TargetResolver::new(session)),
            config,
            abort: AbortSignal::never(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_abort_signal(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    pub fn validator(&self) -> &SpecValidator {
        &self.validator
    }

    /// Validate `spec` and compute its batch plan without dispatching
    pub async fn plan(&self, spec: &TestSpec) -> BenchmarkResult<(TargetGroup, BatchPlan)> {
        let group = self
            .validator
            .validate(spec)
            .await
            .map_err(|e| BenchmarkError::validation(&spec.name, e))?;
        let plan = BatchScheduler::plan(spec, &group);
        Ok((group, plan))
    }

    /// Execute one run.
    ///
    /// Fails only if validation fails, in which case nothing was
    /// dispatched. Every other failure ends up in the summary.
    pub async fn run(&self, spec: &TestSpec) -> BenchmarkResult<BenchmarkRunSummary> {
        let mut run = BenchmarkRun::new(spec);
        let mut abort = self.abort.clone();

        info!(test = %spec.name, target = %spec.target, clients = spec.clients, "Validating benchmark");
        let (_, plan) = self.plan(spec).await?;

        let started = self.clock.now();
        let deadline = deadline_after(started, spec.test_duration);
        run.start_time = Some(self.clock.wall_time());

        let mut pool = ActionPool::new(
            self.dispatcher.clone(),
            self.clock.clone(),
            spec.action.as_str(),
            spec.parameters.clone(),
            &self.config,
        );
        let mut submitted: Vec<ActionId> = Vec::with_capacity(plan.total_units());

        if abort.is_aborted() {
            run.transition(RunStatus::Aborted);
        } else {
            run.transition(RunStatus::Ramping);
            info!(test = %spec.name, batches = plan.len(), "Starting ramp");
        }

        for batch in &plan {
            if run.is_aborted() {
                break;
            }

            let due = deadline_after(started, batch.offset_from_start);
            if abort.guard(self.clock.sleep_until(due)).await.is_none() {
                warn!(test = %spec.name, batch = batch.index, "Abort requested, stopping ramp");
                run.transition(RunStatus::Aborted);
                break;
            }

            submitted.extend(pool.submit_batch(batch).await);
            run.batches_submitted += 1;
        }

        if !run.is_aborted() {
            run.transition(RunStatus::AwaitingCompletion);
        }

        // Already-dispatched actions are tracked to the end even after an abort
        let remaining = deadline.saturating_duration_since(self.clock.now());
        info!(
            test = %spec.name,
            actions = submitted.len(),
            remaining_secs = remaining.as_secs_f64(),
            "Awaiting action completion"
        );
        pool.await_all(&submitted, remaining).await;

        if !run.is_aborted() && abort.is_aborted() {
            warn!(test = %spec.name, "Abort requested while awaiting completion");
            run.transition(RunStatus::Aborted);
        }

        let (counts, failed_units) = tally(pool.actions());
        if !run.is_aborted() {
            let succeeded = counts.get(&ActionStatus::Succeeded).copied().unwrap_or(0);
            if succeeded == 0 {
                run.transition(RunStatus::Failed);
            } else {
                run.transition(RunStatus::Completed);
            }
        }

        let end_time = self.clock.wall_time();
        let summary = BenchmarkRunSummary {
            test_name: spec.name.clone(),
            status: run.status,
            start_time: run.start_time.unwrap_or(end_time),
            end_time,
            duration: self.clock.now().saturating_duration_since(started),
            counts,
            failed_units,
            batches_planned: plan.len(),
            batches_submitted: run.batches_submitted,
        };

        info!(
            test = %spec.name,
            status = %summary.status,
            actions = summary.total_actions(),
            failed = summary.failed_units.len(),
            "Benchmark finished"
        );
        Ok(summary)
    }
}
