//! Synchronous IO engine
//!
//! Uses blocking `lseek`/`read`/`write`/`fsync` on a raw file descriptor. The
//! descriptor is borrowed: the owning [`FileTarget`](crate::target::file::FileTarget)
//! closes it.
//!
//! Each request is one syscall. A short transfer is returned to the caller as
//! a smaller byte count, not completed by looping.

use super::{IOEngine, OperationType};
use crate::error::BenchError;
use crate::Result;
use std::os::unix::io::RawFd;

/// Blocking engine over a borrowed file descriptor
#[derive(Debug)]
pub struct SyncEngine {
    fd: RawFd,

    /// Offset of the next transfer, tracked for error reports
    position: u64,
}

impl SyncEngine {
    pub fn new(fd: RawFd) -> Self {
        Self { fd, position: 0 }
    }

    fn os_error(&self, op: OperationType, offset: u64) -> BenchError {
        BenchError::Io {
            op: op.as_str(),
            offset,
            source: std::io::Error::last_os_error(),
        }
    }
}

impl IOEngine for SyncEngine {
    fn seek(&mut self, offset: u64) -> Result<()> {
        // SAFETY: lseek only requires a valid fd
        let result = unsafe { libc::lseek(self.fd, offset as libc::off_t, libc::SEEK_SET) };
        if result < 0 {
            return Err(self.os_error(OperationType::Seek, offset).into());
        }
        self.position = result as u64;
        Ok(())
    }

    #[inline(always)]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        // SAFETY: buf is valid for buf.len() writable bytes
        let result = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if result < 0 {
            return Err(self.os_error(OperationType::Read, self.position).into());
        }
        self.position += result as u64;
        Ok(result as usize)
    }

    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        // SAFETY: buf is valid for buf.len() readable bytes
        let result = unsafe { libc::write(self.fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
        if result < 0 {
            return Err(self.os_error(OperationType::Write, self.position).into());
        }
        self.position += result as u64;
        Ok(result as usize)
    }

    fn fsync(&mut self) -> Result<()> {
        // SAFETY: fsync only requires a valid fd
        let result = unsafe { libc::fsync(self.fd) };
        if result < 0 {
            return Err(self.os_error(OperationType::Fsync, self.position).into());
        }
        Ok(())
    }
}
