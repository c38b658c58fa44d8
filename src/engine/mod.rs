//! IO engine abstraction
//!
//! An engine issues exactly one system call per request against an open file
//! and reports what the kernel returned. There are no retry loops: a latency
//! tool measures what the device does, it does not work around it.
//!
//! The file position is implicit, as with `read(2)`/`write(2)`: sequential
//! runs rewind once and let each transfer advance the offset, random runs
//! seek before every transfer.
//!
//! # Engine Types
//!
//! - **Synchronous**: blocking `lseek`/`read`/`write`/`fsync` on a raw fd
//! - **Mock**: records every request and can inject a write failure

use crate::Result;

/// Single-request IO interface used by the runners
pub trait IOEngine {
    /// Move the file position to `offset` bytes from the start
    fn seek(&mut self, offset: u64) -> Result<()>;

    /// Read into `buf` at the current position, returning the byte count
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write `buf` at the current position, returning the byte count
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Force previously written data to stable storage
    fn fsync(&mut self) -> Result<()>;

    /// Seek to the start of the file
    fn rewind(&mut self) -> Result<()> {
        self.seek(0)
    }
}

/// Operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Seek,
    Read,
    Write,
    Fsync,
}

impl OperationType {
    /// Syscall name used in error reports
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Seek => "seek",
            OperationType::Read => "read",
            OperationType::Write => "write",
            OperationType::Fsync => "fsync",
        }
    }
}

pub mod mock;
pub mod sync;
