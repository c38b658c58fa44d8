//! iolatency CLI entry point

use iolatency::config::cli::Cli;
use iolatency::output::sink_for;
use iolatency::output::text::Progress;
use iolatency::target::file::FileTargetFactory;
use iolatency::util::clock::MonotonicClock;
use iolatency::{BenchError, Session, TOOL_NAME, VERSION};
use std::io;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let progress = Progress::stderr();
    progress.banner(TOOL_NAME, VERSION);

    // Usage problems are not failures for this tool
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stdout carries the result stream
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let config = cli.session_config();
    if let Err(e) = config.validate() {
        if let BenchError::FileTooSmall { minimum_mb, .. } = &e {
            eprintln!("Filesize should be at least {} MB (or use a smaller --buffer-mb)", minimum_mb);
            return ExitCode::FAILURE;
        }
        error!("{}", e);
        return ExitCode::SUCCESS;
    }

    let sink = sink_for(config.format, io::stdout());
    let mut session = Session::new(config, FileTargetFactory, MonotonicClock::new(), sink).with_progress(progress);

    // Phase failures are reported as they happen and do not change the exit status
    match session.run() {
        Ok(report) => debug!(
            records = report.total_records(),
            direct = ?report.direct,
            buffered = ?report.buffered,
            "session complete"
        ),
        Err(e) => error!("{:#}", e),
    }

    ExitCode::SUCCESS
}
