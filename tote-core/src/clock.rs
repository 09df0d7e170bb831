//! # Time Sources
//!
//! Every timestamp the engine acts on is read server-side at call time.
//! Callers never pass their own clock readings, so betting windows and
//! resolution timing cannot be skewed by a bettor's machine.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of unix timestamps (seconds) for lifecycle decisions.
pub trait Clock: Send + Sync {
    /// Current unix timestamp in seconds.
    fn now(&self) -> u64;
}

/// Wall-clock time via the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Manually driven clock for tests and demos.
///
/// Starts at a chosen timestamp and only moves when told to, which makes
/// betting-window boundaries exact in tests.
#[derive(Debug)]
pub struct FixedClock {
    now: AtomicU64,
}

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Jump to an absolute timestamp.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(1_000);
        assert_eq!(clock.now(), 1_000);

        clock.advance(60);
        assert_eq!(clock.now(), 1_060);

        clock.set(5_000);
        assert_eq!(clock.now(), 5_000, "set should override advances");
    }

    #[test]
    fn test_system_clock_is_recent() {
        let now = SystemClock.now();
        // Well past 2020-01-01; catches a zeroed or wrapped reading.
        assert!(now > 1_577_836_800, "system clock reads {now}");
    }
}
