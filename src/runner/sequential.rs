//! Sequential runner
//!
//! Rewinds, then reads or writes consecutive blocks, letting each transfer
//! advance the file position. The run ends at the time budget or when less
//! than one block of the file remains.

use super::{AccessMode, IoKind, RunContext, RunResult, StopPolicy, Transfer};
use crate::error::BenchError;
use crate::Result;

/// Run one sequential pass at `block_size`.
///
/// Only [`AccessMode::ReadOnly`] and [`AccessMode::WriteOnly`] are valid here.
pub fn run_sequential(ctx: &mut RunContext<'_>, mode: AccessMode, block_size: usize) -> Result<RunResult> {
    let write = match mode {
        AccessMode::ReadOnly => false,
        AccessMode::WriteOnly => true,
        AccessMode::ReadWrite => return Err(BenchError::UnsupportedMode(mode.as_str()).into()),
    };

    ctx.prepare()?;
    ctx.progress.run_status(IoKind::Sequential, mode, block_size);

    let measurement = ctx.iterate(block_size, StopPolicy::TimeOrSpaceBound, |engine, buf, _| {
        Transfer::issue(engine, buf, write)
    })?;

    Ok(ctx.finish(IoKind::Sequential, mode, block_size, measurement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrate::Calibration;
    use crate::engine::mock::MockEngine;
    use crate::engine::{IOEngine, OperationType};
    use crate::output::text::Progress;
    use crate::runner::tests::test_config;
    use crate::util::buffer::AlignedBuffer;
    use crate::util::clock::ManualClock;
    use std::time::Duration;

    const MIB: u64 = 1024 * 1024;

    #[allow(clippy::too_many_arguments)]
    fn run(
        engine: &mut MockEngine,
        file_size: u64,
        max_seconds: u64,
        direct: bool,
        step: Duration,
        calibration: Calibration,
        mode: AccessMode,
        block_size: usize,
    ) -> Result<RunResult> {
        let config = test_config(file_size, max_seconds, direct);
        let mut buffer = AlignedBuffer::new_random(config.buffer_capacity, 512).unwrap();
        let clock = ManualClock::new(step);
        let progress = Progress::silent();
        let mut ctx = RunContext {
            config: &config,
            engine,
            buffer: &mut buffer,
            clock: &clock,
            calibration,
            progress: &progress,
        };
        run_sequential(&mut ctx, mode, block_size)
    }

    #[test]
    fn test_stops_at_end_of_file() {
        let mut engine = MockEngine::new(MIB);
        let result = run(
            &mut engine, MIB, 60, true, Duration::from_micros(1), Calibration::default(),
            AccessMode::WriteOnly, 4096,
        )
        .unwrap();

        assert_eq!(result.num_iterations, 256);
        let offsets = engine.transfer_offsets();
        assert_eq!(offsets.len(), 256);
        assert_eq!(offsets[0], 0);
        assert_eq!(offsets[255], 255 * 4096);
    }

    #[test]
    fn test_stops_before_partial_block() {
        // 10 000 bytes hold two whole 4096-byte blocks
        let mut engine = MockEngine::new(10_000);
        let result = run(
            &mut engine, 10_000, 60, true, Duration::from_micros(1), Calibration::default(),
            AccessMode::ReadOnly, 4096,
        )
        .unwrap();
        assert_eq!(result.num_iterations, 2);
    }

    #[test]
    fn test_stops_at_time_budget() {
        let mut engine = MockEngine::new(MIB);
        let result = run(
            &mut engine, MIB, 1, true, Duration::from_millis(100), Calibration::default(),
            AccessMode::ReadOnly, 4096,
        )
        .unwrap();

        assert_eq!(result.num_iterations, 10);
        assert_eq!(result.usecs, 1_000_000);
        assert_eq!(result.avg_usecs_per_iteration, 100_000);
        assert_eq!(result.iterations_per_second, 10);
    }

    #[test]
    fn test_zero_budget_runs_once() {
        let mut engine = MockEngine::new(MIB);
        let result = run(
            &mut engine, MIB, 0, true, Duration::from_micros(5), Calibration::default(),
            AccessMode::WriteOnly, 512,
        )
        .unwrap();
        assert_eq!(result.num_iterations, 1);
    }

    #[test]
    fn test_rewinds_and_syncs_before_timing() {
        let mut engine = MockEngine::new(MIB);
        engine.seek(12345).unwrap();
        engine.clear();
        run(
            &mut engine, 8192, 60, true, Duration::from_micros(1), Calibration::default(),
            AccessMode::ReadOnly, 4096,
        )
        .unwrap();

        let ops = engine.operations();
        assert_eq!(ops[0].op_type, OperationType::Seek);
        assert_eq!(ops[0].offset, 0);
        assert_eq!(ops[1].op_type, OperationType::Fsync);
    }

    #[test]
    fn test_buffered_writes_are_synced() {
        let mut engine = MockEngine::new(MIB);
        run(
            &mut engine, 16 * 1024, 60, false, Duration::from_micros(1), Calibration::default(),
            AccessMode::WriteOnly, 4096,
        )
        .unwrap();

        let kinds: Vec<_> = engine.operations().iter().skip(2).map(|op| op.op_type).collect();
        assert_eq!(
            kinds,
            vec![
                OperationType::Write, OperationType::Fsync,
                OperationType::Write, OperationType::Fsync,
                OperationType::Write, OperationType::Fsync,
                OperationType::Write, OperationType::Fsync,
            ]
        );
    }

    #[test]
    fn test_direct_writes_not_synced_in_loop() {
        let mut engine = MockEngine::new(MIB);
        run(
            &mut engine, 16 * 1024, 60, true, Duration::from_micros(1), Calibration::default(),
            AccessMode::WriteOnly, 4096,
        )
        .unwrap();

        let fsyncs = engine.operations().iter().filter(|op| op.op_type == OperationType::Fsync).count();
        assert_eq!(fsyncs, 1);
    }

    #[test]
    fn test_correction_floors_at_one() {
        let mut engine = MockEngine::new(MIB);
        // Calibration claims each query costs 1s
        let result = run(
            &mut engine, MIB, 60, true, Duration::from_micros(1), Calibration::new(100_000_000_000),
            AccessMode::ReadOnly, 4096,
        )
        .unwrap();
        assert_eq!(result.usecs, 1);
        assert_eq!(result.avg_usecs_per_iteration, 0);
        assert_eq!(result.iterations_per_second, 256_000_000);
    }

    #[test]
    fn test_rejects_alternating_mode() {
        let mut engine = MockEngine::new(MIB);
        let err = run(
            &mut engine, MIB, 1, true, Duration::from_micros(1), Calibration::default(),
            AccessMode::ReadWrite, 4096,
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<BenchError>(), Some(BenchError::UnsupportedMode("RDWR"))));
        assert!(engine.operations().is_empty());
    }

    #[test]
    fn test_short_read_aborts() {
        let mut engine = MockEngine::new(1000);
        let err = run(
            &mut engine, MIB, 1, true, Duration::from_micros(1), Calibration::default(),
            AccessMode::ReadOnly, 4096,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BenchError>(),
            Some(BenchError::ShortTransfer { expected: 4096, actual: 1000, .. })
        ));
    }

    #[test]
    fn test_write_error_aborts() {
        let mut engine = MockEngine::new(MIB);
        engine.fail_write_at(3);
        let err = run(
            &mut engine, MIB, 60, true, Duration::from_micros(1), Calibration::default(),
            AccessMode::WriteOnly, 4096,
        )
        .unwrap_err();
        assert!(err.downcast_ref::<BenchError>().map(BenchError::is_io).unwrap_or(false));
    }

    #[test]
    fn test_block_larger_than_buffer_rejected() {
        let mut engine = MockEngine::new(MIB);
        let result = run(
            &mut engine, MIB, 1, true, Duration::from_micros(1), Calibration::default(),
            AccessMode::ReadOnly, 128 * 1024,
        );
        assert!(result.is_err());
    }
}
