//! Batch plans describing the client ramp

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::target::UnitRef;
use crate::utils::serde_duration_secs_f64;

/// A group of units that join the run together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub index: usize,
    pub units: Vec<UnitRef>,
    /// Delay after the run start before this batch is submitted
    #[serde(with = "serde_duration_secs_f64")]
    pub offset_from_start: Duration,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Ordered sequence of batches for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub batches: Vec<Batch>,
}

impl BatchPlan {
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Units addressed across all batches
    pub fn total_units(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    /// Offset of the final batch, zero for an empty plan
    pub fn ramp_duration(&self) -> Duration {
        self.batches
            .last()
            .map(|batch| batch.offset_from_start)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Batch> {
        self.batches.iter()
    }
}

impl<'a> IntoIterator for &'a BatchPlan {
    type Item = &'a Batch;
    type IntoIter = std::slice::Iter<'a, Batch>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches.iter()
    }
}
