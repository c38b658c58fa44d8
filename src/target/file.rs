//! File target implementation
//!
//! Creates the benchmark file with `O_RDWR|O_CREAT|O_TRUNC|O_NOATIME`, plus
//! `O_DIRECT` for the direct-IO phase, and sizes it with `ftruncate`. The
//! transfer alignment comes from `fpathconf(_PC_REC_XFER_ALIGN)`.
//!
//! # Example
//!
//! ```no_run
//! use iolatency::target::{OpenFlags, TargetFactory};
//! use iolatency::target::file::FileTargetFactory;
//! use std::path::Path;
//!
//! let mut factory = FileTargetFactory;
//! let path = Path::new("/mnt/test/latency.dat");
//! let mut target = factory.create(path, 1024 * 1024 * 1024, OpenFlags::direct()).unwrap();
//! let alignment = target.alignment().unwrap();
//! target.engine().fsync().unwrap();
//! target.close().unwrap();
//! factory.remove(path).unwrap();
//! ```

use super::{OpenFlags, Target, TargetFactory};
use crate::engine::sync::SyncEngine;
use crate::engine::IOEngine;
use crate::error::BenchError;
use crate::Result;
use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Regular file opened for one IO phase
pub struct FileTarget {
    path: PathBuf,
    file: File,
    engine: SyncEngine,
}

impl FileTarget {
    /// Open (creating and truncating as flagged) and size the file
    pub fn create(path: &Path, size: u64, flags: OpenFlags) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).mode(0o600);

        if flags.create {
            options.create(true);
        }

        if flags.truncate {
            options.truncate(true);
        }

        let mut custom_flags = 0;
        if flags.direct {
            custom_flags |= libc::O_DIRECT;
        }
        if flags.noatime {
            custom_flags |= libc::O_NOATIME;
        }

        if custom_flags != 0 {
            options.custom_flags(custom_flags);
        }

        let file = options
            .open(path)
            .with_context(|| format!("cannot open {} for write", path.display()))?;

        file.set_len(size)
            .with_context(|| format!("cannot size {} to {} bytes", path.display(), size))?;

        let engine = SyncEngine::new(file.as_raw_fd());

        Ok(Self {
            path: path.to_path_buf(),
            file,
            engine,
        })
    }
}

impl Target for FileTarget {
    fn path(&self) -> &Path {
        &self.path
    }

    fn alignment(&self) -> Result<usize> {
        // SAFETY: fpathconf only requires a valid fd
        let alignment = unsafe { libc::fpathconf(self.file.as_raw_fd(), libc::_PC_REC_XFER_ALIGN) };

        if alignment < 1 {
            let err = std::io::Error::last_os_error();
            return Err(anyhow::Error::new(BenchError::InvalidAlignment(alignment as i64)))
                .with_context(|| format!("fpathconf({}) alignment error: {}", self.path.display(), err));
        }

        let alignment = alignment as usize;
        if !alignment.is_power_of_two() {
            return Err(BenchError::InvalidAlignment(alignment as i64).into());
        }

        Ok(alignment)
    }

    fn engine(&mut self) -> &mut dyn IOEngine {
        &mut self.engine
    }

    fn close(self: Box<Self>) -> Result<()> {
        let FileTarget { path, file, .. } = *self;
        // Surface delayed write errors before the descriptor goes away
        file.sync_all()
            .with_context(|| format!("close failed: path={}", path.display()))?;
        drop(file);
        Ok(())
    }
}

/// Factory for [`FileTarget`]s on the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTargetFactory;

impl TargetFactory for FileTargetFactory {
    fn create(&mut self, path: &Path, size: u64, flags: OpenFlags) -> Result<Box<dyn Target>> {
        Ok(Box::new(FileTarget::create(path, size, flags)?))
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("cannot remove {}", path.display()))
    }
}
