//! Ramp scheduling

use fleetbench_core::{Batch, BatchPlan, TargetGroup, TestSpec};
use std::time::Duration;

/// Splits a run's clients into batches joining at fixed intervals
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchScheduler;

impl BatchScheduler {
    /// Take successive `batch_size` slices of the first `clients` units in
    /// resolved order. Batch `i` is offset `i * ramp_interval` from the run
    /// start; the final batch may be smaller.
    pub fn plan(spec: &TestSpec, group: &TargetGroup) -> BatchPlan {
        let clients = spec.clients.min(group.unit_count());

        let batches = group.units[..clients]
            .chunks(spec.batch_size.max(1))
            .enumerate()
            .map(|(index, units)| Batch {
                index,
                units: units.to_vec(),
                offset_from_start: offset(spec.ramp_interval, index),
            })
            .collect();

        BatchPlan { batches }
    }
}

fn offset(ramp_interval: Duration, index: usize) -> Duration {
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    ramp_interval.saturating_mul(index)
}
