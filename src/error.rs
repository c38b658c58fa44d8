//! Error taxonomy
//!
//! Most functions return [`crate::Result`] with context attached at the
//! syscall boundary. The variants below are the failures callers branch on:
//! configuration errors end the process, setup errors skip a phase, and run
//! errors abort the remainder of a sweep.

use std::io;

/// Classified benchmark failures.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("file size {requested} bytes is below the minimum of {minimum} bytes ({minimum_mb} MB)")]
    FileTooSmall {
        requested: u64,
        minimum: u64,
        minimum_mb: u64,
    },

    #[error("clock calibration ran only {iterations} queries, need at least {required}")]
    CalibrationTooShort { iterations: u64, required: u64 },

    #[error("clock query failed: {0}")]
    Timer(#[source] io::Error),

    #[error("cannot {op} file at offset {offset}: {source}")]
    Io {
        op: &'static str,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("short {op}: {actual} of {expected} bytes")]
    ShortTransfer {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("no random offsets available: file size {file_size} with block size {block_size}")]
    OffsetRangeEmpty { file_size: u64, block_size: u64 },

    #[error("invalid IO alignment {0}")]
    InvalidAlignment(i64),

    #[error("alignment {alignment} exceeds quick block size {quick_block_size}")]
    QuickAlignment {
        alignment: usize,
        quick_block_size: usize,
    },

    #[error("{0} access is not supported by the sequential runner")]
    UnsupportedMode(&'static str),

    #[error("cannot allocate aligned buffer of {size} bytes (alignment {alignment})")]
    BufferAllocation { size: usize, alignment: usize },
}

impl BenchError {
    /// Whether this error is a device or syscall failure rather than a
    /// precondition violation.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::ShortTransfer { .. } | Self::Timer(_)
        )
    }
}
