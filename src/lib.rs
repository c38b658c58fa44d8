//! iolatency - storage latency sweep for database-style IO patterns
//!
//! iolatency measures how long single IO requests take on a file under
//! controlled access patterns, sweeping block sizes from the device alignment
//! (or one byte) up to the buffer capacity.
//!
//! # Architecture
//!
//! - **Clock calibration**: measures the cost of the timer itself so it can be
//!   subtracted from every run
//! - **Runners**: sequential (time or end-of-file bound) and random (time bound,
//!   fixed-seed offsets) loops over one block size
//! - **Sweep**: doubling block-size sequence, fail-fast
//! - **Session**: direct-IO phase, then buffered-with-fsync phase, one result
//!   record per (mode, block size)

pub mod calibrate;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod runner;
pub mod session;
pub mod sweep;
pub mod target;
pub mod util;

pub use config::{SessionConfig, TestConfig};
pub use error::BenchError;
pub use session::{PhaseOutcome, Session, SessionReport};

/// Tool name written to the result stream comment
pub const TOOL_NAME: &str = env!("CARGO_PKG_NAME");

/// Tool version written to the result stream comment
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout iolatency
pub type Result<T> = anyhow::Result<T>;
