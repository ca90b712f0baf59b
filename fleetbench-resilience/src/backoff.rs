//! Backoff strategies for the shared polling cadence

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the polling interval grows while nothing changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between polls
    Fixed,

    /// Linear increase: delay = initial_delay * round
    Linear,

    /// Exponential increase: delay = initial_delay * base^(round-1)
    Exponential {
        /// Base for exponential calculation (e.g., 2.0 for doubling)
        base: f64,
    },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Fixed
    }
}

/// Backoff delay calculator
#[derive(Debug, Clone)]
pub struct BackoffCalculator {
    strategy: BackoffStrategy,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl BackoffCalculator {
    pub fn new(
        strategy: BackoffStrategy,
        initial_delay: Duration,
        max_delay: Duration,
        jitter: bool,
    ) -> Self {
        Self {
            strategy,
            initial_delay,
            max_delay: max_delay.max(initial_delay),
            jitter,
        }
    }

    /// Calculate delay for a specific round (1-indexed)
    pub fn calculate_delay(&self, round: u32) -> Duration {
        let capped_delay = self.calculate_base_delay(round).min(self.max_delay);

        if self.jitter {
            self.add_jitter(capped_delay)
        } else {
            capped_delay
        }
    }

    fn calculate_base_delay(&self, round: u32) -> Duration {
        let round = round.max(1);
        match &self.strategy {
            BackoffStrategy::Fixed => self.initial_delay,

            BackoffStrategy::Linear => self.initial_delay.saturating_mul(round),

            BackoffStrategy::Exponential { base } => {
                let multiplier = base.max(1.0).powi(round as i32 - 1);
                let nanos = self.initial_delay.as_nanos() as f64 * multiplier;
                if nanos.is_finite() && nanos < u64::MAX as f64 {
                    Duration::from_nanos(nanos as u64)
                } else {
                    self.max_delay
                }
            }
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        let mut rng = rand::thread_rng();

        // Add ±10% jitter
        let jitter_factor = rng.gen_range(0.9..1.1);
        Duration::from_nanos((delay.as_nanos() as f64 * jitter_factor) as u64)
    }
}

/// Polling cadence shared by all outstanding actions of a run.
///
/// The interval backs off while consecutive poll rounds observe no state
/// change and drops back to the initial interval as soon as one does.
#[derive(Debug, Clone)]
pub struct PollCadence {
    calculator: BackoffCalculator,
    idle_rounds: u32,
}

impl PollCadence {
    pub fn new(calculator: BackoffCalculator) -> Self {
        Self {
            calculator,
            idle_rounds: 0,
        }
    }

    /// Feed the outcome of a poll round and get the delay before the next
    pub fn next_interval(&mut self, progressed: bool) -> Duration {
        if progressed {
            self.idle_rounds = 0;
        } else {
            self.idle_rounds = self.idle_rounds.saturating_add(1);
        }
        self.calculator.calculate_delay(self.idle_rounds + 1)
    }

    pub fn idle_rounds(&self) -> u32 {
        self.idle_rounds
    }
}
