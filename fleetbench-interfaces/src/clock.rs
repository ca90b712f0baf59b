//! Clock interface used for ramp timing and deadlines
//!
//! The engine never sleeps directly. It computes absolute deadlines and
//! waits for them through a [`Clock`], which keeps ramp timing testable
//! without real wall-clock waits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Longest wait a deadline can express, roughly 30 years
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `start + after` without overflowing: durations too large for an
/// instant land on a far-future deadline instead.
pub fn deadline_after(start: Instant, after: Duration) -> Instant {
    start
        .checked_add(after.min(FAR_FUTURE))
        .unwrap_or(start)
}

/// Monotonic time source with a cooperative wait primitive
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current monotonic instant
    fn now(&self) -> Instant;

    /// Current wall-clock time, used for reported timestamps
    fn wall_time(&self) -> DateTime<Utc>;

    /// Suspend until `deadline`; returns immediately if it has passed
    async fn sleep_until(&self, deadline: Instant);
}

/// Clock backed by the tokio timer.
///
/// Under `tokio::time::pause` (or `#[tokio::test(start_paused = true)]`)
/// this runs on virtual time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_sleeps_on_virtual_time() {
        let clock = TokioClock;
        let start = clock.now();

        clock.sleep_until(start + Duration::from_secs(90)).await;
        assert!(clock.now() - start >= Duration::from_secs(90));

        // A deadline in the past returns immediately
        let before = clock.now();
        clock.sleep_until(start).await;
        assert!(clock.now() - before < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_deadline_after_saturates() {
        let start = Instant::now();
        assert_eq!(
            deadline_after(start, Duration::from_secs(60)),
            start + Duration::from_secs(60)
        );
        assert_eq!(deadline_after(start, Duration::MAX), start + FAR_FUTURE);
        assert_eq!(
            deadline_after(start, Duration::from_secs(u64::MAX)),
            start + FAR_FUTURE
        );
    }
}
