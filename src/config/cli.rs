//! CLI argument parsing using clap

use super::{OutputFormat, SessionConfig, DEFAULT_BUFFER_CAPACITY};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Result stream encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Comma-separated values (default)
    Csv,
    /// One JSON object per line
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// iolatency - measure storage latency across block sizes
#[derive(Parser, Debug)]
#[command(name = "iolatency")]
#[command(version, about, long_about = None)]
#[command(after_help = "Sample command line using a 1GB file with 60 secs/test:\n  \
    iolatency MyTestHD /mntpoint/testfile 1024 60 > mytesthd.csv")]
pub struct Cli {
    /// Only test with 16K blocks (InnoDB page size)
    #[arg(long)]
    pub quick: bool,

    /// Buffer capacity in MB; the largest block size tested
    #[arg(long, default_value_t = (DEFAULT_BUFFER_CAPACITY / (1024 * 1024)) as u64)]
    pub buffer_mb: u64,

    /// Result stream format
    #[arg(long, value_enum, default_value = "csv")]
    pub format: FormatArg,

    /// Enable debug diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Free-text label copied into every result line
    #[arg(value_name = "LABEL")]
    pub label: String,

    /// Test file to create (removed afterwards)
    #[arg(value_name = "FILENAME")]
    pub path: PathBuf,

    /// File size in MB
    #[arg(value_name = "MBFILESIZE")]
    pub size_mb: u64,

    /// Maximum seconds per test
    #[arg(value_name = "SECONDS")]
    pub seconds: u64,
}

impl Cli {
    /// Parse arguments, returning clap's error so the caller decides the exit status.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Build the session configuration (not yet validated)
    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(self.label.clone(), self.path.clone(), self.size_mb, self.seconds);
        config.buffer_capacity = usize::try_from(self.buffer_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX);
        config.quick = self.quick;
        config.format = self.format.into();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_args(["iolatency", "ssd", "/mnt/test", "1024", "60"]).unwrap();
        assert!(!cli.quick);
        assert_eq!(cli.label, "ssd");
        assert_eq!(cli.size_mb, 1024);
        assert_eq!(cli.seconds, 60);

        let config = cli.session_config();
        assert_eq!(config.file_size, 1024 * 1024 * 1024);
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(config.format, OutputFormat::Csv);
    }

    #[test]
    fn test_quick_flag_first() {
        let cli = Cli::try_parse_args(["iolatency", "--quick", "ssd", "/mnt/test", "64", "2"]).unwrap();
        assert!(cli.quick);
        assert!(cli.session_config().quick);
    }

    #[test]
    fn test_buffer_and_format_options() {
        let cli = Cli::try_parse_args([
            "iolatency", "--buffer-mb", "64", "--format", "json", "ssd", "/mnt/test", "512", "2",
        ])
        .unwrap();
        let config = cli.session_config();
        assert_eq!(config.buffer_capacity, 64 * 1024 * 1024);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_missing_arguments_rejected() {
        assert!(Cli::try_parse_args(["iolatency", "ssd", "/mnt/test", "1024"]).is_err());
        assert!(Cli::try_parse_args(["iolatency", "a", "b", "1", "2", "3"]).is_err());
    }
}
