//! Output streams
//!
//! Results and progress go to separate streams:
//!
//! - the **result stream** ([`ResultSink`]): a comment line naming the tool and
//!   file, a header, then one record per completed run; CSV or JSON lines
//! - the **progress stream** ([`text::Progress`]): human-readable status on
//!   stderr
//!
//! Sinks flush after every line so the two streams interleave sensibly when
//! both are sent to the same destination.

pub mod csv;
pub mod json;
pub mod text;

use crate::config::OutputFormat;
use crate::runner::RunResult;
use crate::Result;
use std::io::Write;
use std::path::Path;

/// Column names of the result stream, in order
pub const FIELDS: [&str; 13] = [
    "label",
    "iotype",
    "rw",
    "fsize",
    "msize",
    "alignment",
    "direct",
    "max_seconds",
    "iosize",
    "num_iterations",
    "usecs",
    "iterations_per_second",
    "avg_usecs_per_iteration",
];

/// Destination of result records
pub trait ResultSink {
    /// Identify the tool, its version and the file under test
    fn write_comment(&mut self, tool: &str, version: &str, path: &Path) -> Result<()>;

    /// Announce the record fields
    fn write_header(&mut self) -> Result<()>;

    /// Emit one completed run
    fn write_result(&mut self, result: &RunResult) -> Result<()>;
}

/// Collects records in memory
impl ResultSink for Vec<RunResult> {
    fn write_comment(&mut self, _tool: &str, _version: &str, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_result(&mut self, result: &RunResult) -> Result<()> {
        self.push(result.clone());
        Ok(())
    }
}

impl<T: ResultSink + ?Sized> ResultSink for Box<T> {
    fn write_comment(&mut self, tool: &str, version: &str, path: &Path) -> Result<()> {
        (**self).write_comment(tool, version, path)
    }

    fn write_header(&mut self) -> Result<()> {
        (**self).write_header()
    }

    fn write_result(&mut self, result: &RunResult) -> Result<()> {
        (**self).write_result(result)
    }
}

/// Build the sink for `format` over `out`
pub fn sink_for<W: Write + 'static>(format: OutputFormat, out: W) -> Box<dyn ResultSink> {
    match format {
        OutputFormat::Csv => Box::new(csv::CsvSink::new(out)),
        OutputFormat::Json => Box::new(json::JsonSink::new(out)),
    }
}

pub(crate) fn comment_text(tool: &str, version: &str, path: &Path) -> String {
    format!("{} {} operating on file '{}'", tool, version, path.display())
}
