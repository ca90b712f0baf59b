//! External abort coordination
//!
//! An [`AbortCoordinator`] is the single place an operator (or a Ctrl-C
//! handler) cancels running benchmarks. Runs hold an [`AbortSignal`] and
//! race their ramp waits against it. Aborting never touches actions that
//! were already dispatched; those are left to reach their own terminal
//! state.

use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Abort error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AbortError {
    /// Abort was already requested
    #[error("Abort already requested")]
    AlreadyAborted,

    /// Listening for the process interrupt failed
    #[error("Failed to listen for interrupt: {0}")]
    SignalError(String),
}

/// Issues abort requests to every subscribed run
#[derive(Debug, Clone)]
pub struct AbortCoordinator {
    sender: Arc<watch::Sender<bool>>,
}

impl AbortCoordinator {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to abort requests. Subscribers created after an abort
    /// observe it immediately.
    pub fn subscribe(&self) -> AbortSignal {
        AbortSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Request that all subscribed runs abort
    pub fn abort(&self) -> Result<(), AbortError> {
        let mut first = false;
        self.sender.send_if_modified(|aborted| {
            if *aborted {
                false
            } else {
                *aborted = true;
                first = true;
                true
            }
        });

        if first {
            info!("Abort requested");
            Ok(())
        } else {
            Err(AbortError::AlreadyAborted)
        }
    }

    pub fn is_aborted(&self) -> bool {
        *self.sender.borrow()
    }

    /// Abort when the process receives Ctrl-C
    pub fn abort_on_ctrl_c(&self) -> tokio::task::JoinHandle<Result<(), AbortError>> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c()
                .await
                .map_err(|e| AbortError::SignalError(e.to_string()))?;
            warn!("Interrupt received, aborting benchmark");
            match coordinator.abort() {
                Ok(()) | Err(AbortError::AlreadyAborted) => Ok(()),
                Err(e) => Err(e),
            }
        })
    }
}

impl Default for AbortCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of an [`AbortCoordinator`]
#[derive(Debug, Clone)]
pub struct AbortSignal {
    receiver: watch::Receiver<bool>,
}

impl AbortSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self { receiver }
    }

    pub fn is_aborted(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once an abort has been requested. Never resolves if the
    /// coordinator goes away without aborting.
    pub async fn aborted(&mut self) {
        if self.receiver.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Drive `future` to completion unless an abort arrives first
    pub async fn guard<F>(&mut self, future: F) -> Option<F::Output>
    where
        F: Future,
    {
        if self.is_aborted() {
            return None;
        }

        tokio::select! {
            output = future => Some(output),
            _ = self.aborted() => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_abort_reaches_subscribers() {
        let coordinator = AbortCoordinator::new();
        let mut signal = coordinator.subscribe();
        assert!(!signal.is_aborted());

        let waiter = tokio::spawn(async move {
            signal.aborted().await;
            signal.is_aborted()
        });

        coordinator.abort().unwrap();
        assert!(waiter.await.unwrap());
        assert!(coordinator.is_aborted());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_abort() {
        let coordinator = AbortCoordinator::new();
        coordinator.abort().unwrap();

        let mut signal = coordinator.subscribe();
        assert!(signal.is_aborted());
        assert_eq!(signal.guard(async { 42 }).await, None);
    }

    #[tokio::test]
    async fn test_double_abort_rejected() {
        let coordinator = AbortCoordinator::new();
        assert!(coordinator.abort().is_ok());
        assert_eq!(coordinator.abort(), Err(AbortError::AlreadyAborted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_interrupts_sleep() {
        let coordinator = AbortCoordinator::new();
        let mut signal = coordinator.subscribe();

        let aborter = coordinator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            aborter.abort().unwrap();
        });

        let start = tokio::time::Instant::now();
        let outcome = signal
            .guard(tokio::time::sleep(Duration::from_secs(3600)))
            .await;
        assert!(outcome.is_none());
        assert!(start.elapsed() < Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_never_signal_lets_future_finish() {
        let mut signal = AbortSignal::never();
        assert_eq!(signal.guard(async { "done" }).await, Some("done"));
    }
}
