//! Test runners
//!
//! A run measures one access pattern at one block size. Both runners share a
//! single iteration loop and differ only in what one iteration does and in
//! their [`StopPolicy`]:
//!
//! - sequential runs stop at the time budget or when less than one block of
//!   the file is left
//! - random runs stop at the time budget only
//!
//! Each iteration issues one transfer, an fsync after buffered writes, and
//! one clock query. The accumulated cost of those clock queries is removed
//! from the measured time using the session [`Calibration`].

pub mod random;
pub mod sequential;

use crate::calibrate::Calibration;
use crate::config::TestConfig;
use crate::engine::IOEngine;
use crate::error::BenchError;
use crate::output::text::Progress;
use crate::util::buffer::AlignedBuffer;
use crate::util::clock::Clock;
use crate::Result;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Access pattern family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IoKind {
    #[serde(rename = "SEQ")]
    Sequential,
    #[serde(rename = "RND")]
    Random,
}

impl fmt::Display for IoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoKind::Sequential => f.pad("SEQ"),
            IoKind::Random => f.pad("RND"),
        }
    }
}

/// Which transfers a run issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessMode {
    #[serde(rename = "RDONLY")]
    ReadOnly,
    #[serde(rename = "WRONLY")]
    WriteOnly,
    /// Write and read on alternate iterations, starting with a write
    #[serde(rename = "RDWR")]
    ReadWrite,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "RDONLY",
            AccessMode::WriteOnly => "WRONLY",
            AccessMode::ReadWrite => "RDWR",
        }
    }

    /// Whether iteration `n` (0-based) writes
    pub fn writes_on(&self, n: u64) -> bool {
        match self {
            AccessMode::ReadOnly => false,
            AccessMode::WriteOnly => true,
            AccessMode::ReadWrite => n % 2 == 0,
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// When a run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPolicy {
    /// Only the time budget ends the run
    TimeBound,
    /// The time budget or reaching the end of the file, whichever comes first
    TimeOrSpaceBound,
}

/// Everything a run borrows from the session for its duration
pub struct RunContext<'a> {
    pub config: &'a TestConfig,
    pub engine: &'a mut dyn IOEngine,
    pub buffer: &'a mut AlignedBuffer,
    pub clock: &'a dyn Clock,
    pub calibration: Calibration,
    pub progress: &'a Progress,
}

/// Raw loop measurement before correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub iterations: u64,
    pub elapsed: Duration,
}

/// Direction and size of one completed transfer
#[derive(Debug, Clone, Copy)]
pub(crate) struct Transfer {
    write: bool,
    bytes: usize,
}

impl Transfer {
    pub(crate) fn issue(engine: &mut dyn IOEngine, buf: &mut [u8], write: bool) -> Result<Self> {
        let bytes = if write { engine.write(buf)? } else { engine.read(buf)? };
        if bytes != buf.len() {
            return Err(BenchError::ShortTransfer {
                op: if write { "write" } else { "read" },
                expected: buf.len(),
                actual: bytes,
            }
            .into());
        }
        Ok(Self { write, bytes })
    }
}

impl RunContext<'_> {
    /// Position at the start of the file and flush anything pending, so
    /// neither leaks into the timed loop.
    pub(crate) fn prepare(&mut self) -> Result<()> {
        self.engine.rewind()?;
        self.engine.fsync()
    }

    /// Block-size slice of the buffer, rejecting sizes the buffer cannot hold
    fn check_block_size(&self, block_size: usize) -> Result<()> {
        anyhow::ensure!(
            block_size > 0 && block_size <= self.buffer.size(),
            "block size {} outside 1..={}",
            block_size,
            self.buffer.size()
        );
        Ok(())
    }

    /// The shared timed loop.
    ///
    /// `step` performs the transfer of iteration `n` (0-based). The loop always
    /// runs at least one iteration; a failing transfer, fsync or clock query
    /// aborts the run.
    pub(crate) fn iterate<F>(&mut self, block_size: usize, policy: StopPolicy, mut step: F) -> Result<Measurement>
    where
        F: FnMut(&mut dyn IOEngine, &mut [u8], u64) -> Result<Transfer>,
    {
        self.check_block_size(block_size)?;

        let direct = self.config.direct;
        let budget = self.config.max_duration();
        let block = block_size as u64;
        let buf = &mut self.buffer.as_mut_slice()[..block_size];
        let engine = &mut *self.engine;

        let start = self.clock.now()?;
        let mut bytes_left = self.config.file_size;
        let mut iterations: u64 = 0;

        loop {
            let transfer = step(engine, buf, iterations)?;

            // Direct IO is already synchronous at the device
            if transfer.write && !direct {
                engine.fsync()?;
            }

            let now = self.clock.now()?;
            bytes_left = bytes_left.saturating_sub(transfer.bytes as u64);
            iterations += 1;

            let elapsed = now.saturating_sub(start);
            let out_of_time = elapsed >= budget;
            let out_of_space = policy == StopPolicy::TimeOrSpaceBound && bytes_left < block;

            if out_of_time || out_of_space {
                return Ok(Measurement { iterations, elapsed });
            }
        }
    }

    pub(crate) fn finish(&self, kind: IoKind, mode: AccessMode, block_size: usize, measurement: Measurement) -> RunResult {
        let raw_usecs = u64::try_from(measurement.elapsed.as_micros()).unwrap_or(u64::MAX);
        let usecs = self.calibration.correct(raw_usecs, measurement.iterations);
        RunResult::new(self.config, kind, mode, block_size, measurement.iterations, usecs)
    }
}

/// One result record per (mode, block size)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub label: String,
    pub iotype: IoKind,
    pub rw: AccessMode,
    pub fsize: u64,
    pub msize: usize,
    pub alignment: usize,
    pub direct: bool,
    pub max_seconds: u64,
    pub iosize: usize,
    pub num_iterations: u64,
    pub usecs: u64,
    pub iterations_per_second: u64,
    pub avg_usecs_per_iteration: u64,
}

impl RunResult {
    /// Derive the rate columns from corrected microseconds.
    ///
    /// Both derived values use integer division and are truncated, not rounded.
    pub fn new(config: &TestConfig, kind: IoKind, mode: AccessMode, block_size: usize, iterations: u64, usecs: u64) -> Self {
        let (iterations_per_second, avg_usecs_per_iteration) = derive_rates(iterations, usecs);
        Self {
            label: config.label.clone(),
            iotype: kind,
            rw: mode,
            fsize: config.file_size,
            msize: config.buffer_capacity,
            alignment: config.alignment,
            direct: config.direct,
            max_seconds: config.max_seconds,
            iosize: block_size,
            num_iterations: iterations,
            usecs,
            iterations_per_second,
            avg_usecs_per_iteration,
        }
    }
}

/// `(iterations_per_second, avg_usecs_per_iteration)`.
///
/// When the average truncates to zero the rate is taken from the totals
/// instead of dividing by zero.
pub fn derive_rates(iterations: u64, usecs: u64) -> (u64, u64) {
    if iterations == 0 || usecs == 0 {
        return (0, 0);
    }
    let avg = usecs / iterations;
    let rate = if avg > 0 {
        1_000_000 / avg
    } else {
        let exact = 1_000_000u128 * iterations as u128 / usecs as u128;
        u64::try_from(exact).unwrap_or(u64::MAX)
    };
    (rate, avg)
}
