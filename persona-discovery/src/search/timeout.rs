//! Timeout Guard
//!
//! Races an adapter call against a fixed deadline. A slow call becomes a
//! `CallOutcome::TimedOut`, a first-class outcome distinct from an adapter
//! error. The underlying call is simply dropped when the deadline wins; no
//! other cancellation mechanism is involved.

use crate::types::SourceError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default deadline for search calls
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for detail fetches
pub const DETAILS_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a guarded adapter call
#[derive(Debug)]
pub enum CallOutcome<T> {
    /// Call finished in time and succeeded
    Completed(T),
    /// Call finished in time with an adapter error
    Failed(SourceError),
    /// Deadline elapsed first
    TimedOut(Duration),
}

impl<T> CallOutcome<T> {
    /// Successful value, if any
    pub fn completed(self) -> Option<T> {
        match self {
            CallOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CallOutcome::TimedOut(_))
    }
}

/// Deadline wrapper for adapter calls
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    deadline: Duration,
}

impl TimeoutGuard {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `call`, giving up once the deadline elapses
    pub async fn run<T, F>(&self, call: F) -> CallOutcome<T>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        let started = Instant::now();
        match tokio::time::timeout(self.deadline, call).await {
            Ok(Ok(value)) => CallOutcome::Completed(value),
            Ok(Err(e)) => CallOutcome::Failed(e),
            Err(_) => CallOutcome::TimedOut(started.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fast_call_completes() {
        let guard = TimeoutGuard::new(Duration::from_millis(200));
        let outcome = guard.run(async { Ok::<_, SourceError>(42) }).await;
        assert_eq!(outcome.completed(), Some(42));
    }

    #[tokio::test]
    async fn test_error_is_not_a_timeout() {
        let guard = TimeoutGuard::new(Duration::from_millis(200));
        let outcome = guard
            .run(async { Err::<u32, _>(SourceError::Api("boom".to_string())) })
            .await;
        assert!(matches!(outcome, CallOutcome::Failed(SourceError::Api(_))));
        assert!(!outcome.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let guard = TimeoutGuard::new(Duration::from_secs(10));
        let outcome = guard
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, SourceError>(())
            })
            .await;

        match outcome {
            CallOutcome::TimedOut(elapsed) => assert!(elapsed >= Duration::from_secs(10)),
            other => panic!("Expected timeout, got {:?}", other),
        }
    }
}
