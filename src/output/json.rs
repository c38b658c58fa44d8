//! JSON-lines result stream
//!
//! One object per line: a `{"comment": ...}` object, a `{"fields": [...]}`
//! header object, then one object per run keyed by those field names.

use super::{comment_text, ResultSink, FIELDS};
use crate::runner::RunResult;
use crate::Result;
use serde_json::json;
use std::io::Write;
use std::path::Path;

/// JSON-lines writer for run results
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for JsonSink<W> {
    fn write_comment(&mut self, tool: &str, version: &str, path: &Path) -> Result<()> {
        let comment = json!({ "comment": comment_text(tool, version, path) });
        serde_json::to_writer(&mut self.out, &comment)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        serde_json::to_writer(&mut self.out, &json!({ "fields": FIELDS }))?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn write_result(&mut self, result: &RunResult) -> Result<()> {
        serde_json::to_writer(&mut self.out, result)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
