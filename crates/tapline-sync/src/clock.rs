//! # Clock
//!
//! Wall-clock source for the freshness mark. Tests drive a [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;

/// Current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_epoch_millis(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_epoch_millis: i64) -> Self {
        ManualClock {
            now: Arc::new(AtomicI64::new(now_epoch_millis)),
        }
    }

    pub fn set(&self, now_epoch_millis: i64) {
        self.now.store(now_epoch_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_epoch_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();

        clock.advance(500);
        assert_eq!(other.now_epoch_millis(), 1_500);

        other.set(42);
        assert_eq!(clock.now_epoch_millis(), 42);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_epoch_millis() > 1_577_836_800_000);
    }
}
