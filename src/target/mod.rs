//! Target abstraction
//!
//! A target is the benchmark file of one IO phase. The session creates it
//! through a [`TargetFactory`], borrows its engine for every run of the
//! phase, then closes it and removes the backing file.
//!
//! # Target Types
//!
//! - **File**: a regular file, opened with or without O_DIRECT
//! - **Mock**: in-memory stand-in for orchestration tests

use crate::engine::IOEngine;
use crate::Result;
use std::path::Path;

/// An open benchmark file
pub trait Target {
    /// Path of the backing file
    fn path(&self) -> &Path;

    /// Required alignment, in bytes, of buffers, offsets and sizes for
    /// direct IO on this file
    fn alignment(&self) -> Result<usize>;

    /// Engine issuing IO against this file
    fn engine(&mut self) -> &mut dyn IOEngine;

    /// Close the descriptor
    fn close(self: Box<Self>) -> Result<()>;
}

/// Creates and removes benchmark files
pub trait TargetFactory {
    /// Create (or truncate) the file at `path`, size it to `size` bytes and
    /// open it with `flags`
    fn create(&mut self, path: &Path, size: u64, flags: OpenFlags) -> Result<Box<dyn Target>>;

    /// Delete the backing file
    fn remove(&mut self, path: &Path) -> Result<()>;
}

/// Flags for opening a benchmark file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Bypass the page cache (O_DIRECT)
    pub direct: bool,

    /// Do not update access times (O_NOATIME)
    pub noatime: bool,

    /// Create the file if it does not exist
    pub create: bool,

    /// Truncate an existing file to zero before sizing it
    pub truncate: bool,
}

impl OpenFlags {
    /// Flags of the direct-IO phase
    pub fn direct() -> Self {
        Self {
            direct: true,
            ..Self::buffered()
        }
    }

    /// Flags of the buffered-with-fsync phase
    pub fn buffered() -> Self {
        Self {
            direct: false,
            noatime: true,
            create: true,
            truncate: true,
        }
    }
}

pub mod file;
pub mod mock;
