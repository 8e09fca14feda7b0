//! Clock abstraction for time-dependent logic.
//!
//! Signature replay-window checks must be testable without sleeping, so the
//! current time is injected rather than read from the system directly.

use std::sync::atomic::{AtomicI64, Ordering};

use super::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds.
    fn unix_now(&self) -> i64;

    /// Current moment as a [`Timestamp`].
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_secs(self.unix_now())
    }
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Settable clock for tests.
///
/// Starts at a fixed instant and only moves when told to.
#[derive(Debug, Default)]
pub struct FixedClock {
    unix_secs: AtomicI64,
}

impl FixedClock {
    /// Creates a clock frozen at the given Unix time.
    pub fn at(unix_secs: i64) -> Self {
        Self {
            unix_secs: AtomicI64::new(unix_secs),
        }
    }

    /// Moves the clock forward by the given number of seconds.
    pub fn advance(&self, secs: i64) {
        self.unix_secs.fetch_add(secs, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute Unix time.
    pub fn set(&self, unix_secs: i64) {
        self.unix_secs.store(unix_secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn unix_now(&self) -> i64 {
        self.unix_secs.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_stays_put() {
        let clock = FixedClock::at(1_000);
        assert_eq!(clock.unix_now(), 1_000);
        assert_eq!(clock.unix_now(), 1_000);
    }

    #[test]
    fn fixed_clock_advances_on_demand() {
        let clock = FixedClock::at(1_000);
        clock.advance(301);
        assert_eq!(clock.unix_now(), 1_301);
    }

    #[test]
    fn system_clock_tracks_chrono() {
        let clock = SystemClock;
        let before = chrono::Utc::now().timestamp();
        let observed = clock.unix_now();
        let after = chrono::Utc::now().timestamp();
        assert!(before <= observed && observed <= after);
    }
}
