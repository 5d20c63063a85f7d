//! Fixed-interval backoff between winner queries.

use std::time::Duration;

use crate::lifecycle::Lifecycle;

/// Waits the same interval before every retry; the wait ends early on
/// shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    interval: Duration,
}

impl FixedBackoff {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleeps one interval. Returns `true` if shutdown cut the wait short.
    #[inline]
    pub fn wait(&self, lifecycle: &Lifecycle) -> bool {
        lifecycle.wait_timeout(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Logger;
    use std::time::Instant;

    #[test]
    fn test_wait_full_interval() {
        let lifecycle = Lifecycle::new(Logger::disabled());
        let backoff = FixedBackoff::new(Duration::from_millis(15));

        let start = Instant::now();
        assert!(!backoff.wait(&lifecycle));
        assert!(start.elapsed() >= backoff.interval());
    }

    #[test]
    fn test_wait_after_shutdown_returns_immediately() {
        let lifecycle = Lifecycle::new(Logger::disabled());
        lifecycle.shutdown();
        let backoff = FixedBackoff::new(Duration::from_secs(60));

        let start = Instant::now();
        assert!(backoff.wait(&lifecycle));
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}
