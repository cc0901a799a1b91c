//! Clock capability.
//!
//! Components that need wall-clock time take a [`Clock`] rather than calling
//! [`SystemTime::now`] directly, so tests can substitute a fixed or scripted
//! time source and assert on timestamps exactly.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> SystemTime;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> SystemTime {
        (**self).now()
    }
}

/// The real system clock.
///
/// ```rust
/// use headway::clock::{Clock, SystemClock};
///
/// let before = std::time::SystemTime::now();
/// assert!(SystemClock.now() >= before);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to.
///
/// Useful in tests that assert on the timestamps of emitted error events.
///
/// ```rust
/// use headway::clock::{Clock, FixedClock};
/// use std::time::{Duration, SystemTime};
///
/// let clock = FixedClock::new(SystemTime::UNIX_EPOCH);
/// assert_eq!(clock.now(), SystemTime::UNIX_EPOCH);
/// clock.advance(Duration::from_secs(60));
/// assert_eq!(clock.now(), SystemTime::UNIX_EPOCH + Duration::from_secs(60));
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<SystemTime>,
}

impl FixedClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: SystemTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().expect("clock lock poisoned")
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod clock_tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_stable() {
        let clock = FixedClock::default();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::default();
        let start = clock.now();
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), start + Duration::from_millis(250));
    }
}
