//! Random runner
//!
//! Seeks to a pseudo-random block-aligned offset before every transfer. The
//! generator is reseeded with [`RANDOM_SEED`] at the start of every run, so
//! repeated runs and repeated invocations visit the same offsets in the same
//! order. Only the time budget ends a random run.

use super::{AccessMode, IoKind, RunContext, RunResult, StopPolicy, Transfer};
use crate::config::RANDOM_SEED;
use crate::error::BenchError;
use crate::Result;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Block-aligned offsets in `[0, file_size - block_size)`
///
/// Offsets are `n * block_size` with `n` uniform in
/// `[0, (file_size - block_size) / block_size)`.
pub struct OffsetGenerator {
    rng: Xoshiro256PlusPlus,
    blocks: u64,
    block_size: u64,
}

impl OffsetGenerator {
    /// Generator seeded with [`RANDOM_SEED`]
    pub fn new(file_size: u64, block_size: u64) -> Result<Self> {
        Self::with_seed(file_size, block_size, RANDOM_SEED)
    }

    pub fn with_seed(file_size: u64, block_size: u64, seed: u64) -> Result<Self> {
        let blocks = match block_size {
            0 => 0,
            _ => file_size.saturating_sub(block_size) / block_size,
        };
        if blocks == 0 {
            return Err(BenchError::OffsetRangeEmpty { file_size, block_size }.into());
        }

        Ok(Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            blocks,
            block_size,
        })
    }

    /// Number of distinct offsets
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    #[inline(always)]
    pub fn next_offset(&mut self) -> u64 {
        self.rng.gen_range(0..self.blocks) * self.block_size
    }
}

impl Iterator for OffsetGenerator {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        Some(self.next_offset())
    }
}

/// Run one random-offset pass at `block_size` for the configured time budget.
///
/// In [`AccessMode::ReadWrite`] iterations alternate write, read, write, ...
pub fn run_random(ctx: &mut RunContext<'_>, mode: AccessMode, block_size: usize) -> Result<RunResult> {
    let mut offsets = OffsetGenerator::new(ctx.config.file_size, block_size as u64)?;

    // Timing starts from a clean state; the position itself is never used
    ctx.prepare()?;
    ctx.progress.run_status(IoKind::Random, mode, block_size);

    let measurement = ctx.iterate(block_size, StopPolicy::TimeBound, |engine, buf, n| {
        engine.seek(offsets.next_offset())?;
        Transfer::issue(engine, buf, mode.writes_on(n))
    })?;

    Ok(ctx.finish(IoKind::Random, mode, block_size, measurement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrate::Calibration;
    use crate::engine::mock::MockEngine;
    use crate::engine::OperationType;
    use crate::output::text::Progress;
    use crate::runner::tests::test_config;
    use crate::util::buffer::AlignedBuffer;
    use crate::util::clock::ManualClock;
    use std::time::Duration;

    const MIB: u64 = 1024 * 1024;

    fn run(engine: &mut MockEngine, file_size: u64, direct: bool, mode: AccessMode, block_size: usize) -> Result<RunResult> {
        // 100ms per clock query with a 1s budget: ten iterations
        let config = test_config(file_size, 1, direct);
        let mut buffer = AlignedBuffer::new_random(config.buffer_capacity, 512).unwrap();
        let clock = ManualClock::new(Duration::from_millis(100));
        let progress = Progress::silent();
        let mut ctx = RunContext {
            config: &config,
            engine,
            buffer: &mut buffer,
            clock: &clock,
            calibration: Calibration::default(),
            progress: &progress,
        };
        run_random(&mut ctx, mode, block_size)
    }

    #[test]
    fn test_offsets_deterministic() {
        let a: Vec<u64> = OffsetGenerator::new(64 * MIB, 4096).unwrap().take(1000).collect();
        let b: Vec<u64> = OffsetGenerator::new(64 * MIB, 4096).unwrap().take(1000).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_offsets_aligned_and_in_range() {
        let file_size = 64 * MIB;
        let block = 16384;
        for offset in OffsetGenerator::new(file_size, block).unwrap().take(10_000) {
            assert_eq!(offset % block, 0);
            assert!(offset < file_size - block);
        }
    }

    #[test]
    fn test_offsets_spread() {
        let mut seen = std::collections::HashSet::new();
        for offset in OffsetGenerator::new(MIB, 4096).unwrap().take(5000) {
            seen.insert(offset);
        }
        // 255 possible offsets, 5000 draws
        assert!(seen.len() > 200);
    }

    #[test]
    fn test_different_seed_differs() {
        let a: Vec<u64> = OffsetGenerator::with_seed(64 * MIB, 512, 1).unwrap().take(32).collect();
        let b: Vec<u64> = OffsetGenerator::with_seed(64 * MIB, 512, 2).unwrap().take(32).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_equal_to_block_rejected() {
        let err = OffsetGenerator::new(4096, 4096).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<BenchError>(),
            Some(BenchError::OffsetRangeEmpty { file_size: 4096, block_size: 4096 })
        ));
        assert!(OffsetGenerator::new(8191, 4096).is_err());
        assert!(OffsetGenerator::new(4096, 0).is_err());
        assert_eq!(OffsetGenerator::new(8192, 4096).unwrap().blocks(), 1);
    }

    #[test]
    fn test_repeated_runs_visit_same_offsets() {
        let mut engine = MockEngine::new(64 * MIB);
        run(&mut engine, 64 * MIB, true, AccessMode::ReadOnly, 4096).unwrap();
        let first = engine.transfer_offsets();
        engine.clear();
        run(&mut engine, 64 * MIB, true, AccessMode::ReadOnly, 4096).unwrap();
        assert_eq!(first, engine.transfer_offsets());

        let expected: Vec<u64> = OffsetGenerator::new(64 * MIB, 4096).unwrap().take(first.len()).collect();
        assert_eq!(first, expected);
    }

    #[test]
    fn test_time_bound_only() {
        // Two blocks of file, yet the run continues until the budget is spent
        let mut engine = MockEngine::new(8192);
        let result = run(&mut engine, 8192, true, AccessMode::ReadOnly, 4096).unwrap();
        assert_eq!(result.num_iterations, 10);
        assert!(engine.transfer_offsets().iter().all(|&offset| offset == 0));
    }

    #[test]
    fn test_alternating_starts_with_write() {
        let mut engine = MockEngine::new(MIB);
        let result = run(&mut engine, MIB, true, AccessMode::ReadWrite, 4096).unwrap();
        assert_eq!(result.rw, AccessMode::ReadWrite);

        let transfers: Vec<_> = engine
            .operations()
            .iter()
            .map(|op| op.op_type)
            .filter(|op| matches!(op, OperationType::Read | OperationType::Write))
            .collect();
        assert_eq!(transfers.len(), 10);
        for (n, op) in transfers.iter().enumerate() {
            let expected = if n % 2 == 0 { OperationType::Write } else { OperationType::Read };
            assert_eq!(*op, expected, "iteration {}", n);
        }
    }

    #[test]
    fn test_seek_precedes_each_transfer() {
        let mut engine = MockEngine::new(MIB);
        run(&mut engine, MIB, true, AccessMode::WriteOnly, 4096).unwrap();

        let ops = engine.operations();
        // rewind and fsync, then seek/write pairs
        for pair in ops[2..].chunks(2) {
            assert_eq!(pair[0].op_type, OperationType::Seek);
            assert_eq!(pair[1].op_type, OperationType::Write);
            assert_eq!(pair[0].offset, pair[1].offset);
        }
    }

    #[test]
    fn test_buffered_fsync_only_after_writes() {
        let mut engine = MockEngine::new(MIB);
        run(&mut engine, MIB, false, AccessMode::ReadWrite, 4096).unwrap();

        let ops = engine.operations();
        let loop_ops: Vec<_> = ops[2..].iter().map(|op| op.op_type).collect();
        let fsyncs = loop_ops.iter().filter(|op| **op == OperationType::Fsync).count();
        assert_eq!(fsyncs, 5);
        for window in loop_ops.windows(2) {
            if window[1] == OperationType::Fsync {
                assert_eq!(window[0], OperationType::Write);
            }
        }
    }

    #[test]
    fn test_precondition_checked_before_io() {
        let mut engine = MockEngine::new(4096);
        assert!(run(&mut engine, 4096, true, AccessMode::ReadOnly, 4096).is_err());
        assert!(engine.operations().is_empty());
    }
}
