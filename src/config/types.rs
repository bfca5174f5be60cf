//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::fs_ops::transfer::DEFAULT_CHUNK_SIZE;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one sort run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tree to read files from
    pub source_dir: PathBuf,
    /// Root under which `<category>/` directories are created
    pub dest_dir: PathBuf,
    /// Copy chunk size in bytes
    pub chunk_size: usize,
    /// Cap on concurrently running transfers (None = unbounded)
    pub max_concurrent_transfers: Option<usize>,
    /// Per-transfer deadline (None = no deadline)
    pub transfer_timeout: Option<Duration>,
    /// Descend into symlinked directories (loops are detected and skipped)
    pub follow_symlinks: bool,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            dest_dir: PathBuf::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_transfers: None,
            transfer_timeout: None,
            follow_symlinks: false,
            log_level: LogLevel::Normal,
            log_file: None,
        }
    }
}

impl Config {
    /// Construct a Config for the given directories; other fields use defaults.
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parsing_is_lenient() {
        assert_eq!(LogLevel::parse("QUIET"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::parse("verbose"), Some(LogLevel::Info));
        assert_eq!("trace".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Normal.to_string(), "normal");
    }

    #[test]
    fn defaults() {
        let cfg = Config::new("/in", "/out");
        assert_eq!(cfg.chunk_size, 1024);
        assert!(cfg.max_concurrent_transfers.is_none());
        assert!(cfg.transfer_timeout.is_none());
        assert!(!cfg.follow_symlinks);
    }
}
