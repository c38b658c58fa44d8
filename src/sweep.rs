//! Block-size sweep
//!
//! A sweep runs one (kind, mode) combination at every block size from the
//! phase minimum (the alignment for direct IO, 1 otherwise) up to the buffer
//! capacity, doubling each step. Each result is written as soon as its run
//! completes; the first failing run ends the sweep.

use crate::config::TestConfig;
use crate::output::ResultSink;
use crate::runner::random::run_random;
use crate::runner::sequential::run_sequential;
use crate::runner::{AccessMode, IoKind, RunContext, RunResult};
use crate::Result;
use tracing::debug;

/// Doubling block sizes from `start` up to and including `max`
#[derive(Debug, Clone)]
pub struct BlockSizes {
    next: Option<usize>,
    max: usize,
}

impl BlockSizes {
    pub fn new(start: usize, max: usize) -> Self {
        let next = (start > 0 && start <= max).then_some(start);
        Self { next, max }
    }

    /// Sweep sizes for a phase
    pub fn for_config(config: &TestConfig) -> Self {
        Self::new(config.min_block_size(), config.buffer_capacity)
    }
}

impl Iterator for BlockSizes {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = current.checked_mul(2).filter(|&n| n <= self.max);
        Some(current)
    }
}

/// Run a single (kind, mode, block size) and emit its record
pub fn run_one(
    ctx: &mut RunContext<'_>,
    kind: IoKind,
    mode: AccessMode,
    block_size: usize,
    sink: &mut dyn ResultSink,
) -> Result<RunResult> {
    let result = match kind {
        IoKind::Sequential => run_sequential(ctx, mode, block_size)?,
        IoKind::Random => run_random(ctx, mode, block_size)?,
    };
    sink.write_result(&result)?;
    Ok(result)
}

/// Run `kind`/`mode` across the full block-size sequence.
///
/// Returns the number of records written. Records written before a failure
/// stay in the sink.
pub fn run_sweep(ctx: &mut RunContext<'_>, kind: IoKind, mode: AccessMode, sink: &mut dyn ResultSink) -> Result<usize> {
    ctx.progress.sweep_heading(ctx.config, kind, mode);

    let mut records = 0;
    for block_size in BlockSizes::for_config(ctx.config) {
        let result = run_one(ctx, kind, mode, block_size, sink)?;
        debug!(
            iotype = %kind,
            rw = %mode,
            iosize = block_size,
            iterations = result.num_iterations,
            usecs = result.usecs,
            "run complete"
        );
        records += 1;
    }

    Ok(records)
}
