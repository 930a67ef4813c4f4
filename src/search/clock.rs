//! Time sources for cache expiry.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock routed through tokio so paused-time tests advance it too.
/// Outside a runtime this is plain `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Manually advanced clock. Clones share the same offset, so a test can keep
/// one handle while the cache owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = other.now();

        clock.advance(Duration::from_secs(5));
        assert_eq!(other.now() - start, Duration::from_secs(5));
    }

    #[test]
    fn test_manual_clock_frozen_without_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), clock.now());
    }
}
