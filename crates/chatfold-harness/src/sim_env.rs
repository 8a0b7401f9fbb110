//! Simulated environment on tokio's clock.
//!
//! Under `#[tokio::test(start_paused = true)]` time only moves when the test
//! calls `tokio::time::advance` or every task is idle in a sleep, so settle
//! windows and retry pauses are reproducible.

use std::time::Duration;

use chatfold_core::env::Environment;

/// Environment backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimEnv;

impl SimEnv {
    /// Create a new simulated environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
