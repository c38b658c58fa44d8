//! CSV result stream
//!
//! ```text
//! ; iolatency 0.1.0 operating on file '/mnt/test/latency.dat'
//! label,iotype,rw,fsize,msize,alignment,direct,max_seconds,iosize,num_iterations,usecs,iterations_per_second,avg_usecs_per_iteration
//! ssd,SEQ,WRONLY,1073741824,8388608,512,1,60,512,117260,60000491,1956,511
//! ```

use super::{comment_text, ResultSink, FIELDS};
use crate::runner::RunResult;
use crate::Result;
use std::io::Write;
use std::path::Path;

/// CSV writer for run results
pub struct CsvSink<W: Write> {
    out: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Quote a field only when it would break the row
fn escape(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn write_comment(&mut self, tool: &str, version: &str, path: &Path) -> Result<()> {
        writeln!(self.out, "; {}", comment_text(tool, version, path))?;
        self.out.flush()?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        writeln!(self.out, "{}", FIELDS.join(","))?;
        self.out.flush()?;
        Ok(())
    }

    fn write_result(&mut self, r: &RunResult) -> Result<()> {
        writeln!(
            self.out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            escape(&r.label),
            r.iotype,
            r.rw,
            r.fsize,
            r.msize,
            r.alignment,
            u8::from(r.direct),
            r.max_seconds,
            r.iosize,
            r.num_iterations,
            r.usecs,
            r.iterations_per_second,
            r.avg_usecs_per_iteration,
        )?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::runner::{AccessMode, IoKind};

    fn sample(label: &str) -> RunResult {
        let mut session = SessionConfig::new(label, "/mnt/test/latency.dat", 1024, 60);
        session.buffer_capacity = 8 * 1024 * 1024;
        let config = session.test_config(512, true);
        RunResult::new(&config, IoKind::Sequential, AccessMode::WriteOnly, 512, 117_260, 60_000_491)
    }

    #[test]
    fn test_comment_and_header() {
        let mut sink = CsvSink::new(Vec::new());
        sink.write_comment("iolatency", "0.1.0", Path::new("/mnt/test/latency.dat")).unwrap();
        sink.write_header().unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "; iolatency 0.1.0 operating on file '/mnt/test/latency.dat'");
        assert_eq!(
            lines[1],
            "label,iotype,rw,fsize,msize,alignment,direct,max_seconds,iosize,num_iterations,usecs,iterations_per_second,avg_usecs_per_iteration"
        );
    }

    #[test]
    fn test_record_line() {
        let mut sink = CsvSink::new(Vec::new());
        sink.write_result(&sample("ssd")).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "ssd,SEQ,WRONLY,1073741824,8388608,512,1,60,512,117260,60000491,1956,511\n");
    }

    #[test]
    fn test_label_with_comma_quoted() {
        let mut sink = CsvSink::new(Vec::new());
        sink.write_result(&sample("raid 10, ext4")).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.starts_with("\"raid 10, ext4\",SEQ,"));
        assert_eq!(text.trim_end().rsplit(',').count(), 14);
    }
}
