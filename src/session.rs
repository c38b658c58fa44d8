//! Session orchestration
//!
//! A session calibrates the clock once, then runs two phases against the same
//! path:
//!
//! 1. **Direct**: the file is opened with O_DIRECT and every mode is swept
//!    (sequential write and read, random write, read and alternating).
//! 2. **Buffered**: the file is recreated without O_DIRECT and only the write
//!    modes are swept, each write followed by an fsync. Buffered reads would
//!    measure the page cache.
//!
//! Each phase moves through setup, sweeping and teardown. A setup failure
//! skips the phase; a run failure ends it. Either way the descriptor is closed
//! and the file removed before the next phase starts, and the other phase is
//! still attempted.

use crate::calibrate::{calibrate, Calibration};
use crate::config::{SessionConfig, TestConfig, QUICK_BLOCK_SIZE};
use crate::engine::IOEngine;
use crate::error::BenchError;
use crate::output::text::Progress;
use crate::output::ResultSink;
use crate::runner::{AccessMode, IoKind, RunContext, RunResult};
use crate::sweep::{run_one, run_sweep};
use crate::target::{OpenFlags, Target, TargetFactory};
use crate::util::buffer::AlignedBuffer;
use crate::util::clock::Clock;
use crate::{Result, TOOL_NAME, VERSION};
use std::fmt;
use std::path::Path;
use tracing::{debug, error, warn};

/// Modes swept with direct IO, in order
pub const DIRECT_PLAN: [(IoKind, AccessMode); 5] = [
    (IoKind::Sequential, AccessMode::WriteOnly),
    (IoKind::Sequential, AccessMode::ReadOnly),
    (IoKind::Random, AccessMode::WriteOnly),
    (IoKind::Random, AccessMode::ReadOnly),
    (IoKind::Random, AccessMode::ReadWrite),
];

/// Modes swept with buffered IO plus fsync, in order
pub const BUFFERED_PLAN: [(IoKind, AccessMode); 2] = [
    (IoKind::Sequential, AccessMode::WriteOnly),
    (IoKind::Random, AccessMode::WriteOnly),
];

/// IO phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Direct,
    Buffered,
}

impl Phase {
    pub fn is_direct(self) -> bool {
        self == Phase::Direct
    }

    pub fn open_flags(self) -> OpenFlags {
        match self {
            Phase::Direct => OpenFlags::direct(),
            Phase::Buffered => OpenFlags::buffered(),
        }
    }

    pub fn plan(self) -> &'static [(IoKind, AccessMode)] {
        match self {
            Phase::Direct => &DIRECT_PLAN,
            Phase::Buffered => &BUFFERED_PLAN,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Direct => f.write_str("direct"),
            Phase::Buffered => f.write_str("buffered"),
        }
    }
}

/// How a phase ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Every planned run completed
    Completed { records: usize },
    /// Opening, sizing, alignment query or buffer allocation failed; no runs
    SetupFailed { reason: String },
    /// A run failed; `records` were emitted before it
    RunFailed { records: usize, reason: String },
}

impl PhaseOutcome {
    /// Records emitted during the phase
    pub fn records(&self) -> usize {
        match self {
            PhaseOutcome::Completed { records } | PhaseOutcome::RunFailed { records, .. } => *records,
            PhaseOutcome::SetupFailed { .. } => 0,
        }
    }
}

/// Outcome of both phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub calibration: Calibration,
    pub direct: PhaseOutcome,
    pub buffered: PhaseOutcome,
}

impl SessionReport {
    pub fn total_records(&self) -> usize {
        self.direct.records() + self.buffered.records()
    }
}

/// Counts records passing through to the real sink, so a failed sweep can
/// still report how much it emitted.
struct CountingSink<'a> {
    inner: &'a mut dyn ResultSink,
    written: usize,
}

impl ResultSink for CountingSink<'_> {
    fn write_comment(&mut self, tool: &str, version: &str, path: &Path) -> Result<()> {
        self.inner.write_comment(tool, version, path)
    }

    fn write_header(&mut self) -> Result<()> {
        self.inner.write_header()
    }

    fn write_result(&mut self, result: &RunResult) -> Result<()> {
        self.inner.write_result(result)?;
        self.written += 1;
        Ok(())
    }
}

/// A complete benchmark session over one path
pub struct Session<F, C, S> {
    config: SessionConfig,
    factory: F,
    clock: C,
    sink: S,
    progress: Progress,
}

impl<F, C, S> Session<F, C, S>
where
    F: TargetFactory,
    C: Clock,
    S: ResultSink,
{
    pub fn new(config: SessionConfig, factory: F, clock: C, sink: S) -> Self {
        Self {
            config,
            factory,
            clock,
            sink,
            progress: Progress::silent(),
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run calibration and both phases.
    ///
    /// Only configuration, calibration and result-stream failures are
    /// returned as errors; phase failures are reported in the
    /// [`SessionReport`].
    pub fn run(&mut self) -> Result<SessionReport> {
        self.config.validate()?;

        self.sink.write_comment(TOOL_NAME, VERSION, &self.config.path)?;

        let window = self.config.calibration_window;
        self.progress.calibrating(window);
        let calibration = calibrate(&self.clock, window)?;
        self.progress.calibrated(calibration);
        debug!(
            usecs_per_queries = calibration.usecs_per_queries(),
            window_secs = window.as_secs(),
            "timer calibrated"
        );

        self.sink.write_header()?;

        let direct = self.run_phase(Phase::Direct, calibration);
        let buffered = self.run_phase(Phase::Buffered, calibration);

        self.progress.finished();
        Ok(SessionReport {
            calibration,
            direct,
            buffered,
        })
    }

    fn run_phase(&mut self, phase: Phase, calibration: Calibration) -> PhaseOutcome {
        debug!(%phase, path = %self.config.path.display(), size = self.config.file_size, "phase setup");

        let created = self
            .factory
            .create(&self.config.path, self.config.file_size, phase.open_flags());
        let mut target = match created {
            Ok(target) => target,
            Err(e) => {
                let outcome = self.setup_failed(phase, &e);
                // O_CREAT may have left the file behind
                self.remove_file(phase);
                return outcome;
            }
        };

        let outcome = match self.setup(phase, &*target) {
            Ok((config, mut buffer)) => self.sweep_phase(phase, &config, target.engine(), &mut buffer, calibration),
            Err(e) => self.setup_failed(phase, &e),
        };

        debug!(%phase, "phase teardown");
        if let Err(e) = target.close() {
            warn!(%phase, error = %format!("{:#}", e), "failed to close benchmark file");
        }
        self.remove_file(phase);

        match &outcome {
            PhaseOutcome::Completed { records } => debug!(%phase, records, "phase complete"),
            PhaseOutcome::RunFailed { records, reason } => error!(%phase, records, %reason, "phase aborted"),
            PhaseOutcome::SetupFailed { .. } => {}
        }
        outcome
    }

    /// Alignment, quick-mode check and buffer
    fn setup(&self, phase: Phase, target: &dyn Target) -> Result<(TestConfig, AlignedBuffer)> {
        let alignment = target.alignment()?;
        debug!(%phase, alignment, "alignment queried");

        if phase.is_direct() && self.config.quick && alignment > QUICK_BLOCK_SIZE {
            return Err(BenchError::QuickAlignment {
                alignment,
                quick_block_size: QUICK_BLOCK_SIZE,
            }
            .into());
        }

        let config = self.config.test_config(alignment, phase.is_direct());
        let buffer = AlignedBuffer::new_random(self.config.buffer_capacity, alignment)?;
        Ok((config, buffer))
    }

    fn sweep_phase(
        &mut self,
        phase: Phase,
        config: &TestConfig,
        engine: &mut dyn IOEngine,
        buffer: &mut AlignedBuffer,
        calibration: Calibration,
    ) -> PhaseOutcome {
        let quick = self.config.quick;
        let mut ctx = RunContext {
            config,
            engine,
            buffer,
            clock: &self.clock,
            calibration,
            progress: &self.progress,
        };
        let mut sink = CountingSink {
            inner: &mut self.sink,
            written: 0,
        };

        for &(kind, mode) in phase.plan() {
            let swept = if quick {
                ctx.progress.sweep_heading(config, kind, mode);
                run_one(&mut ctx, kind, mode, QUICK_BLOCK_SIZE, &mut sink).map(|_| 1)
            } else {
                run_sweep(&mut ctx, kind, mode, &mut sink)
            };

            if let Err(e) = swept {
                ctx.progress.run_failed();
                return PhaseOutcome::RunFailed {
                    records: sink.written,
                    reason: format!("{} {}: {:#}", kind, mode, e),
                };
            }
        }

        PhaseOutcome::Completed { records: sink.written }
    }

    fn setup_failed(&self, phase: Phase, e: &anyhow::Error) -> PhaseOutcome {
        let reason = format!("{:#}", e);
        warn!(%phase, %reason, "skipping phase");
        self.progress.phase_skipped(&self.config.path, &reason);
        PhaseOutcome::SetupFailed { reason }
    }

    fn remove_file(&mut self, phase: Phase) {
        match self.factory.remove(&self.config.path) {
            Ok(()) => debug!(%phase, path = %self.config.path.display(), "benchmark file removed"),
            Err(e) => warn!(%phase, error = %format!("{:#}", e), "failed to remove benchmark file"),
        }
    }
}
