//! Human-readable progress on stderr
//!
//! These lines are for the operator watching the run; nothing parses them.
//! Formatting lives in plain functions so it can be tested without capturing
//! stderr.

use crate::calibrate::Calibration;
use crate::config::{TestConfig, CALIBRATION_QUERIES};
use crate::runner::{AccessMode, IoKind};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Progress writer. A silent instance discards everything.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    enabled: bool,
}

impl Progress {
    pub fn stderr() -> Self {
        Self { enabled: true }
    }

    pub fn silent() -> Self {
        Self { enabled: false }
    }

    // Progress is best effort; a closed stderr must not end a run
    fn emit(&self, text: &str) {
        if !self.enabled {
            return;
        }
        let mut err = io::stderr().lock();
        let _ = err.write_all(text.as_bytes());
        let _ = err.flush();
    }

    pub fn banner(&self, tool: &str, version: &str) {
        self.emit(&format!("{} {}\n\n", tool, version));
    }

    pub fn calibrating(&self, window: Duration) {
        self.emit(&calibrating_line(window));
    }

    pub fn calibrated(&self, calibration: Calibration) {
        self.emit(&calibrated_line(calibration));
    }

    pub fn phase_skipped(&self, path: &Path, reason: &str) {
        self.emit(&format!("skipping tests on {}: {}\n", path.display(), reason));
    }

    pub fn sweep_heading(&self, config: &TestConfig, kind: IoKind, mode: AccessMode) {
        self.emit(&sweep_heading_line(config, kind, mode));
    }

    /// In-place status; the carriage return lets the next status overwrite it
    pub fn run_status(&self, kind: IoKind, mode: AccessMode, block_size: usize) {
        self.emit(&run_status_line(kind, mode, block_size));
    }

    pub fn run_failed(&self) {
        self.emit("run fail\n");
    }

    pub fn finished(&self) {
        self.emit("Benchmark finished.\n");
    }
}

/// No trailing newline; [`calibrated_line`] completes it
pub fn calibrating_line(window: Duration) -> String {
    format!("* Calculating timekeeping latency over {} seconds...", window.as_secs())
}

pub fn calibrated_line(calibration: Calibration) -> String {
    format!(" {} usecs per {} calls\n", calibration.usecs_per_queries(), CALIBRATION_QUERIES)
}

pub fn sweep_heading_line(config: &TestConfig, kind: IoKind, mode: AccessMode) -> String {
    format!(
        "= {} {} {:<6} (fsize={},msize={},alignment={},direct={},max_seconds={})\n",
        config.label,
        kind,
        mode,
        config.file_size,
        config.buffer_capacity,
        config.alignment,
        u8::from(config.direct),
        config.max_seconds,
    )
}

pub fn run_status_line(kind: IoKind, mode: AccessMode, block_size: usize) -> String {
    format!("{} {} iosize={}\r", kind, mode, block_size)
}
