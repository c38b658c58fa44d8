//! Timing primitive
//!
//! Every runner iteration queries the clock once, so the query goes through a
//! small trait: production code reads `CLOCK_MONOTONIC` directly via libc,
//! tests drive a [`ManualClock`] that advances a fixed step per query.

use crate::error::BenchError;
use crate::Result;
use std::cell::Cell;
use std::time::Duration;

/// Source of monotonic timestamps
pub trait Clock {
    /// Current time as an offset from an arbitrary fixed origin
    fn now(&self) -> Result<Duration>;
}

/// `clock_gettime(CLOCK_MONOTONIC)` without the `Instant` wrapper
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline(always)]
    fn now(&self) -> Result<Duration> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        // SAFETY: ts is a valid, writable timespec
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        if rc < 0 {
            return Err(BenchError::Timer(std::io::Error::last_os_error()).into());
        }

        Ok(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
    }
}

/// Deterministic clock: each query returns the previous value plus `step`.
///
/// The first query returns `step`.
#[derive(Debug)]
pub struct ManualClock {
    step: Duration,
    current: Cell<Duration>,
    queries: Cell<u64>,
}

impl ManualClock {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            current: Cell::new(Duration::ZERO),
            queries: Cell::new(0),
        }
    }

    /// Number of `now()` calls so far
    pub fn queries(&self) -> u64 {
        self.queries.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Result<Duration> {
        let next = self.current.get() + self.step;
        self.current.set(next);
        self.queries.set(self.queries.get() + 1);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let start = clock.now().unwrap();
        thread::sleep(Duration::from_millis(10));
        let end = clock.now().unwrap();

        let elapsed = end.saturating_sub(start);
        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn test_manual_clock_steps() {
        let clock = ManualClock::new(Duration::from_micros(3));
        assert_eq!(clock.now().unwrap(), Duration::from_micros(3));
        assert_eq!(clock.now().unwrap(), Duration::from_micros(6));
        assert_eq!(clock.queries(), 2);
    }
}
