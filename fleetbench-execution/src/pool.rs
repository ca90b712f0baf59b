//! Action tracking for one benchmark run
//!
//! The pool is the only writer of action state. Every unit in a submitted
//! batch yields exactly one tracked action: accepted submissions start
//! `Pending`, refused ones are recorded `Failed` straight away. Status
//! only ever moves forward and each action takes at most one terminal
//! transition.

use chrono::{DateTime, Utc};
use fleetbench_config::ExecutionConfig;
use fleetbench_core::{Action, ActionId, Batch, DispatchError, Parameters, UnitRef};
use fleetbench_interfaces::{deadline_after, ActionDispatcher, ActionReport, Clock, DispatchReceipt};
use fleetbench_resilience::{BackoffCalculator, PollCadence};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Keyed store of the actions dispatched during one run
pub struct ActionPool {
    dispatcher: Arc<dyn ActionDispatcher>,
    clock: Arc<dyn Clock>,
    action: String,
    parameters: Parameters,
    max_concurrency: usize,
    poll_backoff: BackoffCalculator,
    actions: HashMap<ActionId, Action>,
    order: Vec<ActionId>,
}

impl ActionPool {
    /// A pool dispatching `action` with `parameters` to every submitted unit
    pub fn new(
        dispatcher: Arc<dyn ActionDispatcher>,
        clock: Arc<dyn Clock>,
        action: impl Into<String>,
        parameters: Parameters,
        config: &ExecutionConfig,
    ) -> Self {
        Self {
            dispatcher,
            clock,
            action: action.into(),
            parameters,
            max_concurrency: config.max_concurrent_dispatch.max(1),
            poll_backoff: config.poll_calculator(),
            actions: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Dispatch every unit of `batch` concurrently and start tracking the
    /// resulting actions. A refused submission is recorded as `Failed`
    /// and never retried; it does not affect the rest of the batch.
    pub async fn submit_batch(&mut self, batch: &Batch) -> Vec<ActionId> {
        let limit = batch.len().min(self.max_concurrency).max(1);
        let dispatcher = &self.dispatcher;
        let action = self.action.as_str();
        let parameters = &self.parameters;

        let outcomes: Vec<(UnitRef, Result<DispatchReceipt, DispatchError>)> =
            stream::iter(batch.units.iter().cloned())
                .map(|unit| async move {
                    let outcome = dispatcher.submit(&unit, action, parameters).await;
                    (unit, outcome)
                })
                .buffer_unordered(limit)
                .collect()
                .await;

        let at = self.clock.wall_time();
        let mut ids = Vec::with_capacity(outcomes.len());
        let mut refused = 0;

        for (unit, outcome) in outcomes {
            let tracked = match outcome {
                Ok(receipt) => Action::pending(unit, receipt.as_str(), at),
                Err(e) => {
                    warn!(unit = %unit, error = %e, "Dispatch failed");
                    refused += 1;
                    Action::dispatch_failed(unit, &e, at)
                }
            };
            ids.push(self.insert(tracked));
        }

        info!(
            batch = batch.index,
            units = batch.len(),
            refused,
            "Submitted batch"
        );
        ids
    }

    /// Poll `ids` on one shared cadence until all are terminal or `timeout`
    /// runs out, then force whatever is left to `TimedOut`.
    ///
    /// At least one poll pass happens even with a zero timeout. Actions
    /// that are already terminal are never polled again.
    pub async fn await_all(
        &mut self,
        ids: &[ActionId],
        timeout: Duration,
    ) -> HashMap<ActionId, Action> {
        let deadline = deadline_after(self.clock.now(), timeout);
        let mut cadence = PollCadence::new(self.poll_backoff.clone());

        loop {
            let outstanding = self.outstanding(ids);
            if outstanding.is_empty() {
                break;
            }

            let progressed = self.poll_round(&outstanding).await;
            if self.outstanding(ids).is_empty() {
                break;
            }

            let now = self.clock.now();
            if now >= deadline {
                break;
            }

            let wake = deadline_after(now, cadence.next_interval(progressed)).min(deadline);
            debug!(
                outstanding = outstanding.len(),
                idle_rounds = cadence.idle_rounds(),
                "Waiting for next poll round"
            );
            self.clock.sleep_until(wake).await;
        }

        let at = self.clock.wall_time();
        let mut timed_out = 0;
        for id in ids {
            if let Some(action) = self.actions.get_mut(id) {
                if action.time_out(at) {
                    timed_out += 1;
                }
            }
        }
        if timed_out > 0 {
            warn!(timed_out, "Actions did not finish before the deadline");
        }

        ids.iter()
            .filter_map(|id| self.actions.get(id).map(|action| (*id, action.clone())))
            .collect()
    }

    pub fn get(&self, id: &ActionId) -> Option<&Action> {
        self.actions.get(id)
    }

    /// All tracked actions in submission order
    pub fn actions(&self) -> impl Iterator<Item = &Action> + '_ {
        self.order.iter().filter_map(|id| self.actions.get(id))
    }

    pub fn ids(&self) -> &[ActionId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, action: Action) -> ActionId {
        let id = action.id;
        self.order.push(id);
        self.actions.insert(id, action);
        id
    }

    fn outstanding(&self, ids: &[ActionId]) -> Vec<(ActionId, DispatchReceipt)> {
        ids.iter()
            .filter_map(|id| self.actions.get(id))
            .filter(|action| !action.is_terminal())
            .filter_map(|action| {
                action
                    .receipt
                    .as_ref()
                    .map(|receipt| (action.id, DispatchReceipt::new(receipt.clone())))
            })
            .collect()
    }

    /// One pass over the outstanding actions. Returns whether any action
    /// changed state.
    async fn poll_round(&mut self, outstanding: &[(ActionId, DispatchReceipt)]) -> bool {
        let dispatcher = &self.dispatcher;

        let reports: Vec<(ActionId, Result<ActionReport, DispatchError>)> =
            stream::iter(outstanding.iter())
                .map(|(id, receipt)| async move { (*id, dispatcher.poll(receipt).await) })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;

        let at = self.clock.wall_time();
        let mut progressed = false;
        for (id, report) in reports {
            progressed |= match report {
                Ok(report) => self.apply(id, report, at),
                Err(DispatchError::UnknownReceipt(receipt)) => {
                    // The dispatcher lost track of it; it will never resolve
                    self.apply(
                        id,
                        ActionReport::failed(format!("dispatcher lost receipt {}", receipt)),
                        at,
                    )
                }
                Err(e) => {
                    debug!(action = %id, error = %e, "Poll failed, retrying next round");
                    false
                }
            };
        }
        progressed
    }

    fn apply(&mut self, id: ActionId, report: ActionReport, at: DateTime<Utc>) -> bool {
        let Some(action) = self.actions.get_mut(&id) else {
            return false;
        };

        let changed = if report.status.is_terminal() {
            action.finish(report.status, report.result, report.error, at)
        } else {
            action.advance(report.status, at)
        };

        if changed {
            debug!(unit = %action.unit, status = %action.status, "Action status changed");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetbench_core::ActionStatus;
    use fleetbench_interfaces::TokioClock;
    use fleetbench_sim::{ApplicationSpec, FleetSpec, SimActionSpec, SimulatedFleet};

    fn fleet(units: usize, action: SimActionSpec, unreachable: &[usize]) -> Arc<SimulatedFleet> {
        Arc::new(SimulatedFleet::new(FleetSpec::new("woodpecker").with_application(
            "woodpecker",
            "magpie",
            ApplicationSpec::new(units)
                .unreachable(unreachable.iter().copied())
                .with_action("fio", action),
        )))
    }

    fn pool(fleet: Arc<SimulatedFleet>) -> ActionPool {
        ActionPool::new(
            fleet,
            Arc::new(TokioClock),
            "fio",
            Parameters::new(),
            &ExecutionConfig::default(),
        )
    }

    fn batch(units: usize) -> Batch {
        Batch {
            index: 0,
            units: (0..units).map(|i| UnitRef::numbered("magpie", i)).collect(),
            offset_from_start: Duration::ZERO,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_dispatch_failure() {
        let fleet = fleet(20, SimActionSpec::new().completes_after(Duration::from_secs(3)), &[7]);
        let mut pool = pool(fleet.clone());

        let ids = pool.submit_batch(&batch(20)).await;
        assert_eq!(ids.len(), 20);
        assert_eq!(fleet.submitted(), 19);

        let failed: Vec<&Action> = pool
            .actions()
            .filter(|a| a.status == ActionStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].unit, UnitRef::from("magpie/7"));
        assert!(failed[0].receipt.is_none());

        let actions = pool.await_all(&ids, Duration::from_secs(60)).await;
        let succeeded = actions
            .values()
            .filter(|a| a.status == ActionStatus::Succeeded)
            .count();
        assert_eq!(succeeded, 19);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_all_forces_timeout_at_deadline() {
        let fleet = fleet(2, SimActionSpec::new().hanging(), &[]);
        let mut pool = pool(fleet);

        let ids = pool.submit_batch(&batch(2)).await;
        let started = tokio::time::Instant::now();
        let actions = pool.await_all(&ids, Duration::from_secs(30)).await;

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(30) && waited < Duration::from_secs(31));
        assert!(actions.values().all(|a| a.status == ActionStatus::TimedOut));
        assert!(actions.values().all(|a| a.completed_at.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_still_polls_once() {
        let fleet = fleet(1, SimActionSpec::new(), &[]);
        let mut pool = pool(fleet.clone());

        let ids = pool.submit_batch(&batch(1)).await;
        let actions = pool.await_all(&ids, Duration::ZERO).await;

        assert_eq!(fleet.polls(), 1);
        assert_eq!(actions[&ids[0]].status, ActionStatus::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_actions_are_not_repolled() {
        let fleet = fleet(1, SimActionSpec::new().completes_after(Duration::from_secs(2)), &[]);
        let mut pool = pool(fleet.clone());

        let ids = pool.submit_batch(&batch(1)).await;
        let first = pool.await_all(&ids, Duration::from_secs(10)).await;
        let polls = fleet.polls();

        let second = pool.await_all(&ids, Duration::from_secs(10)).await;
        assert_eq!(fleet.polls(), polls);
        assert_eq!(first[&ids[0]].status, ActionStatus::Succeeded);
        assert_eq!(second[&ids[0]].status, ActionStatus::Succeeded);
        assert_eq!(first[&ids[0]].completed_at, second[&ids[0]].completed_at);
    }

    #[tokio::test]
    async fn test_reports_never_move_backwards() {
        let fleet = fleet(1, SimActionSpec::new().hanging(), &[]);
        let mut pool = pool(fleet);
        let ids = pool.submit_batch(&batch(1)).await;
        let now = Utc::now();

        assert!(pool.apply(ids[0], ActionReport::running(), now));
        assert!(!pool.apply(ids[0], ActionReport::pending(), now));
        assert!(pool.apply(ids[0], ActionReport::succeeded(None), now));
        assert!(!pool.apply(ids[0], ActionReport::failed("late"), now));
        assert_eq!(pool.get(&ids[0]).map(|a| a.status), Some(ActionStatus::Succeeded));
    }
}
