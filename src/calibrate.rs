//! Clock calibration
//!
//! Every runner iteration queries the clock, and on some hosts that query is
//! not free. The calibrator spins on the clock for a fixed window, derives the
//! cost per [`CALIBRATION_QUERIES`] queries, and later runs subtract that cost
//! scaled by their iteration count.
//!
//! The cost is kept as microseconds per 100 000 queries so it stays an
//! integer with useful precision.

use crate::config::CALIBRATION_QUERIES;
use crate::error::BenchError;
use crate::util::clock::Clock;
use crate::Result;
use std::time::Duration;
use tracing::debug;

/// Measured timer overhead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Calibration {
    usecs_per_queries: u64,
}

impl Calibration {
    /// Use a known overhead, in microseconds per [`CALIBRATION_QUERIES`] queries
    pub fn new(usecs_per_queries: u64) -> Self {
        Self { usecs_per_queries }
    }

    /// Overhead in microseconds per [`CALIBRATION_QUERIES`] queries
    pub fn usecs_per_queries(&self) -> u64 {
        self.usecs_per_queries
    }

    /// Timer cost accumulated over `iterations` queries, truncated
    pub fn overhead_usecs(&self, iterations: u64) -> u64 {
        let total = iterations as u128 * self.usecs_per_queries as u128 / CALIBRATION_QUERIES as u128;
        u64::try_from(total).unwrap_or(u64::MAX)
    }

    /// Subtract the timer cost from a raw measurement, never going below 1µs
    pub fn correct(&self, raw_usecs: u64, iterations: u64) -> u64 {
        raw_usecs.saturating_sub(self.overhead_usecs(iterations)).max(1)
    }
}

/// Query `clock` back to back for at least `window` and derive the overhead.
///
/// Fails if fewer than [`CALIBRATION_QUERIES`] queries fit in the window,
/// since the per-batch cost would then be a division by zero.
pub fn calibrate(clock: &dyn Clock, window: Duration) -> Result<Calibration> {
    let start = clock.now()?;
    let mut iterations: u64 = 0;
    let mut elapsed;

    loop {
        let end = clock.now()?;
        iterations += 1;
        elapsed = end.saturating_sub(start);
        if elapsed >= window {
            break;
        }
    }

    let batches = iterations / CALIBRATION_QUERIES;
    if batches == 0 {
        return Err(BenchError::CalibrationTooShort {
            iterations,
            required: CALIBRATION_QUERIES,
        }
        .into());
    }

    let usecs = elapsed.as_micros() as u64;
    let calibration = Calibration::new(usecs / batches);
    debug!(
        iterations,
        elapsed_usecs = usecs,
        usecs_per_queries = calibration.usecs_per_queries(),
        "clock calibrated"
    );

    Ok(calibration)
}
