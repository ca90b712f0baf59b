//! Benchmark execution configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use fleetbench_resilience::{BackoffCalculator, BackoffStrategy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Benchmark execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Interval between status polls of outstanding actions
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Upper bound for the poll interval while backing off
    #[serde(with = "humantime_serde", default = "default_max_poll_interval")]
    pub max_poll_interval: Duration,

    /// How the poll interval grows while no action changes state
    #[serde(default)]
    pub poll_backoff: BackoffStrategy,

    /// Whether to add jitter to the poll interval
    #[serde(default)]
    pub poll_jitter: bool,

    /// Maximum number of concurrent submissions within one batch
    #[serde(default = "default_max_concurrent_dispatch")]
    pub max_concurrent_dispatch: usize,

    /// Refuse to run benchmarks when no datasource is configured
    #[serde(default)]
    pub require_datasource: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_poll_interval: default_max_poll_interval(),
            poll_backoff: BackoffStrategy::default(),
            poll_jitter: false,
            max_concurrent_dispatch: default_max_concurrent_dispatch(),
            require_datasource: false,
        }
    }
}

impl ExecutionConfig {
    /// Backoff calculator driving the shared poll loop
    pub fn poll_calculator(&self) -> BackoffCalculator {
        BackoffCalculator::new(
            self.poll_backoff.clone(),
            self.poll_interval,
            self.max_poll_interval,
            self.poll_jitter,
        )
    }
}

impl Validatable for ExecutionConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.poll_interval.as_millis(),
            "poll_interval",
            self.domain_name(),
        )?;

        if self.max_poll_interval < self.poll_interval {
            return Err(self.validation_error(format!(
                "max_poll_interval ({:?}) must not be shorter than poll_interval ({:?})",
                self.max_poll_interval, self.poll_interval
            )));
        }

        if let BackoffStrategy::Exponential { base } = self.poll_backoff {
            if base.is_nan() || base < 1.0 {
                return Err(self.validation_error(format!(
                    "exponential poll_backoff base must be at least 1.0, got {}",
                    base
                )));
            }
        }

        validate_positive(
            self.max_concurrent_dispatch,
            "max_concurrent_dispatch",
            self.domain_name(),
        )?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "execution"
    }
}

// Default value functions
fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_max_poll_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_max_concurrent_dispatch() -> usize {
    64
}
