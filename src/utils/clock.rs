use tokio::time::Instant;

/// Monotonic time source for the session heuristics.
///
/// Backed by `tokio::time::Instant` so paused-runtime tests can advance it.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
