//! In-memory target for orchestration tests
//!
//! [`MockTargetFactory`] hands out [`MockEngine`]-backed targets with a fixed
//! reported alignment and remembers which files were created and removed.

use super::{OpenFlags, Target, TargetFactory};
use crate::engine::mock::MockEngine;
use crate::engine::IOEngine;
use crate::error::BenchError;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Target backed by a [`MockEngine`]
pub struct MockTarget {
    path: PathBuf,
    alignment: i64,
    engine: MockEngine,
    closed: Arc<Mutex<u32>>,
}

impl Target for MockTarget {
    fn path(&self) -> &Path {
        &self.path
    }

    fn alignment(&self) -> Result<usize> {
        if self.alignment < 1 {
            return Err(BenchError::InvalidAlignment(self.alignment).into());
        }
        Ok(self.alignment as usize)
    }

    fn engine(&mut self) -> &mut dyn IOEngine {
        &mut self.engine
    }

    fn close(self: Box<Self>) -> Result<()> {
        *self.closed.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        Ok(())
    }
}

/// One `create` call seen by the factory
#[derive(Debug, Clone)]
pub struct CreatedTarget {
    pub path: PathBuf,
    pub size: u64,
    pub flags: OpenFlags,
    pub engine: MockEngine,
}

#[derive(Debug, Default)]
struct FactoryLog {
    created: Vec<CreatedTarget>,
    removed: Vec<PathBuf>,
}

/// Factory producing [`MockTarget`]s
#[derive(Debug, Clone)]
pub struct MockTargetFactory {
    alignment: i64,
    fail_open_direct: bool,
    fail_write: Option<(bool, u64)>,
    log: Arc<Mutex<FactoryLog>>,
    closed: Arc<Mutex<u32>>,
}

impl MockTargetFactory {
    /// Targets report `alignment` (values below 1 make the query fail)
    pub fn new(alignment: i64) -> Self {
        Self {
            alignment,
            fail_open_direct: false,
            fail_write: None,
            log: Arc::new(Mutex::new(FactoryLog::default())),
            closed: Arc::new(Mutex::new(0)),
        }
    }

    /// Refuse to open files with O_DIRECT, like filesystems without support
    pub fn fail_open_direct(mut self) -> Self {
        self.fail_open_direct = true;
        self
    }

    /// Fail the `n`-th write on the target of the given phase
    pub fn fail_write_at(mut self, direct: bool, n: u64) -> Self {
        self.fail_write = Some((direct, n));
        self
    }

    pub fn created(&self) -> Vec<CreatedTarget> {
        self.log.lock().unwrap_or_else(|p| p.into_inner()).created.clone()
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.log.lock().unwrap_or_else(|p| p.into_inner()).removed.clone()
    }

    /// Number of targets closed so far
    pub fn closed(&self) -> u32 {
        *self.closed.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl TargetFactory for MockTargetFactory {
    fn create(&mut self, path: &Path, size: u64, flags: OpenFlags) -> Result<Box<dyn Target>> {
        if flags.direct && self.fail_open_direct {
            return Err(BenchError::Io {
                op: "open",
                offset: 0,
                source: std::io::Error::from_raw_os_error(libc::EINVAL),
            }
            .into());
        }

        let engine = MockEngine::new(size);
        if let Some((direct, n)) = self.fail_write {
            if direct == flags.direct {
                engine.fail_write_at(n);
            }
        }

        self.log.lock().unwrap_or_else(|p| p.into_inner()).created.push(CreatedTarget {
            path: path.to_path_buf(),
            size,
            flags,
            engine: engine.clone(),
        });

        Ok(Box::new(MockTarget {
            path: path.to_path_buf(),
            alignment: self.alignment,
            engine,
            closed: Arc::clone(&self.closed),
        }))
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        self.log.lock().unwrap_or_else(|p| p.into_inner()).removed.push(path.to_path_buf());
        Ok(())
    }
}
