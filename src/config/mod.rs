//! Configuration for a benchmark session
//!
//! [`SessionConfig`] is built once from the command line and validated before
//! any file is touched. Each IO phase derives a [`TestConfig`] from it once the
//! device alignment is known; both are immutable afterwards.

pub mod cli;

use crate::error::BenchError;
use std::path::PathBuf;
use std::time::Duration;

/// Default buffer capacity (8 MiB)
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024 * 1024;

/// Minimum file size expressed in buffer capacities
pub const MIN_FILE_BUFFERS: u64 = 4;

/// How long the clock calibration loop runs
pub const CALIBRATION_WINDOW: Duration = Duration::from_secs(5);

/// Calibration is reported per this many clock queries
pub const CALIBRATION_QUERIES: u64 = 100_000;

/// Block size used by quick mode (InnoDB page size)
pub const QUICK_BLOCK_SIZE: usize = 16384;

/// Seed for the random-offset generator, reset before every random run
pub const RANDOM_SEED: u64 = 1;

const MIB: u64 = 1024 * 1024;

/// Encoding of the result stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Comment line, header line, one comma-separated line per run
    #[default]
    Csv,
    /// One JSON object per line
    Json,
}

/// Session-wide parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Free-text identifier copied into every record
    pub label: String,

    /// File created, exercised and removed by each phase
    pub path: PathBuf,

    /// File size in bytes
    pub file_size: u64,

    /// Buffer capacity in bytes; also the largest block size of a sweep
    pub buffer_capacity: usize,

    /// Per-run time budget in whole seconds
    pub max_seconds: u64,

    /// Run only [`QUICK_BLOCK_SIZE`] per mode
    pub quick: bool,

    /// Result stream encoding
    pub format: OutputFormat,

    /// Duration of the clock calibration loop
    pub calibration_window: Duration,
}

impl SessionConfig {
    /// Create a configuration with the default buffer capacity.
    ///
    /// `size_mb` is in mebibytes, matching the command line.
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>, size_mb: u64, max_seconds: u64) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            file_size: size_mb.saturating_mul(MIB),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_seconds,
            quick: false,
            format: OutputFormat::Csv,
            calibration_window: CALIBRATION_WINDOW,
        }
    }

    /// Smallest file size this configuration accepts
    pub fn minimum_file_size(&self) -> u64 {
        self.buffer_capacity as u64 * MIN_FILE_BUFFERS
    }

    /// Check the preconditions that must hold before any run.
    pub fn validate(&self) -> Result<(), BenchError> {
        let minimum = self.minimum_file_size();
        if self.file_size < minimum {
            return Err(BenchError::FileTooSmall {
                requested: self.file_size,
                minimum,
                minimum_mb: minimum / MIB,
            });
        }
        if self.buffer_capacity == 0 {
            return Err(BenchError::BufferAllocation {
                size: 0,
                alignment: 1,
            });
        }
        Ok(())
    }

    /// Freeze the per-phase parameters once the alignment is known.
    pub fn test_config(&self, alignment: usize, direct: bool) -> TestConfig {
        TestConfig {
            label: self.label.clone(),
            path: self.path.clone(),
            file_size: self.file_size,
            buffer_capacity: self.buffer_capacity,
            alignment,
            direct,
            max_seconds: self.max_seconds,
        }
    }
}

/// Immutable parameters shared by every run of one phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    pub label: String,
    pub path: PathBuf,
    pub file_size: u64,
    pub buffer_capacity: usize,
    pub alignment: usize,
    pub direct: bool,
    pub max_seconds: u64,
}

impl TestConfig {
    /// Time budget of a single run
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_seconds)
    }

    /// First block size of a sweep: the alignment for direct IO, otherwise 1
    pub fn min_block_size(&self) -> usize {
        if self.direct {
            self.alignment
        } else {
            1
        }
    }
}
