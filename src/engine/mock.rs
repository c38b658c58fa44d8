//! Mock IO engine for testing
//!
//! Simulates a file of fixed size without any system calls. Every request is
//! recorded so tests can check offsets and read/write ordering, and a write
//! failure (for example a full disk) can be injected at the N-th write.
//!
//! # Example
//!
//! ```
//! use iolatency::engine::{IOEngine, OperationType};
//! use iolatency::engine::mock::MockEngine;
//!
//! let mut engine = MockEngine::new(1024 * 1024);
//! engine.seek(4096).unwrap();
//! engine.write(&[0u8; 512]).unwrap();
//!
//! let ops = engine.operations();
//! assert_eq!(ops[1].op_type, OperationType::Write);
//! assert_eq!(ops[1].offset, 4096);
//! ```

use super::{IOEngine, OperationType};
use crate::error::BenchError;
use crate::Result;
use std::sync::{Arc, Mutex};

/// Record of a submitted operation for testing verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub op_type: OperationType,
    pub offset: u64,
    pub length: usize,
}

#[derive(Debug, Default)]
struct MockState {
    file_size: u64,
    position: u64,
    writes: u64,
    fail_write_at: Option<u64>,
    ops: Vec<OperationRecord>,
}

/// Mock IO engine
///
/// Clones share state, so a test can keep a handle while the session owns
/// the boxed engine.
#[derive(Debug, Clone)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    /// Create a mock over a simulated file of `file_size` bytes
    pub fn new(file_size: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                file_size,
                ..MockState::default()
            })),
        }
    }

    /// Fail the `n`-th write (1-based, counted over the engine's lifetime)
    /// with `ENOSPC`.
    pub fn fail_write_at(&self, n: u64) {
        self.lock().fail_write_at = Some(n);
    }

    /// All operations submitted so far
    pub fn operations(&self) -> Vec<OperationRecord> {
        self.lock().ops.clone()
    }

    /// Offsets of read and write requests, in order
    pub fn transfer_offsets(&self) -> Vec<u64> {
        self.lock()
            .ops
            .iter()
            .filter(|op| matches!(op.op_type, OperationType::Read | OperationType::Write))
            .map(|op| op.offset)
            .collect()
    }

    /// Forget recorded operations
    pub fn clear(&self) {
        self.lock().ops.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned mock only happens after a test already panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transfer(&self, op_type: OperationType, length: usize) -> Result<usize> {
        let mut state = self.lock();
        let offset = state.position;
        state.ops.push(OperationRecord { op_type, offset, length });

        if op_type == OperationType::Write {
            state.writes += 1;
            if state.fail_write_at == Some(state.writes) {
                return Err(BenchError::Io {
                    op: "write",
                    offset,
                    source: std::io::Error::from_raw_os_error(libc::ENOSPC),
                }
                .into());
            }
        }

        let available = state.file_size.saturating_sub(offset);
        let done = match op_type {
            OperationType::Read => (length as u64).min(available) as usize,
            _ => length,
        };
        state.position += done as u64;
        state.file_size = state.file_size.max(state.position);
        Ok(done)
    }
}

impl IOEngine for MockEngine {
    fn seek(&mut self, offset: u64) -> Result<()> {
        let mut state = self.lock();
        state.ops.push(OperationRecord {
            op_type: OperationType::Seek,
            offset,
            length: 0,
        });
        state.position = offset;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.transfer(OperationType::Read, buf.len())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.transfer(OperationType::Write, buf.len())
    }

    fn fsync(&mut self) -> Result<()> {
        let mut state = self.lock();
        let offset = state.position;
        state.ops.push(OperationRecord {
            op_type: OperationType::Fsync,
            offset,
            length: 0,
        });
        Ok(())
    }
}
