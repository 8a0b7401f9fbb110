//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from wall-clock time. Production code uses real
//! monotonic time; simulation uses tokio's paused clock so settle windows and
//! timeouts can be driven step by step.

use std::time::Duration;

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// Implementations MUST guarantee that `now()` never goes backwards.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time (e.g., `tokio::time::Instant` with a
    /// paused clock).
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps; state machines receive time through ticks.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
