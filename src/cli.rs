//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - Flags override values from the XML config file.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, ValueHint};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::types::{Config, LogLevel};

/// Sort files into per-extension folders.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Copy every file under SOURCE into DEST/<extension>/ concurrently"
)]
pub struct Args {
    /// Source directory to read files from.
    #[arg(value_name = "SOURCE", value_hint = ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Destination root; created if missing.
    #[arg(value_name = "DEST", value_hint = ValueHint::DirPath)]
    pub dest: Option<PathBuf>,

    /// Read settings from this XML file instead of the default location.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Cap on concurrently running transfers (default: unbounded).
    #[arg(long = "max-concurrent", value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Abort and fail any single transfer that runs longer than this.
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Copy chunk size in bytes.
    #[arg(long = "chunk-size", value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Descend into symlinked directories (loops are detected and skipped).
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also write logs to this file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON.
    #[arg(long)]
    pub json: bool,

    /// Print which config file would be used, then exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(s) = &self.source {
            cfg.source_dir = s.clone();
        }
        if let Some(d) = &self.dest {
            cfg.dest_dir = d.clone();
        }
        if let Some(n) = self.max_concurrent {
            cfg.max_concurrent_transfers = Some(n);
        }
        if let Some(ms) = self.timeout_ms {
            cfg.transfer_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(c) = self.chunk_size {
            cfg.chunk_size = c;
        }
        if self.follow_symlinks {
            cfg.follow_symlinks = true;
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(f) = &self.log_file {
            cfg.log_file = Some(f.clone());
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "ext_sorter",
            "/in",
            "/out",
            "--max-concurrent",
            "4",
            "--timeout-ms",
            "250",
            "--chunk-size",
            "64",
            "-d",
        ])
        .unwrap();
        let mut cfg = Config::new("/cfg-in", "/cfg-out");
        cfg.chunk_size = 4096;
        args.apply_overrides(&mut cfg);

        assert_eq!(cfg.source_dir, PathBuf::from("/in"));
        assert_eq!(cfg.dest_dir, PathBuf::from("/out"));
        assert_eq!(cfg.max_concurrent_transfers, Some(4));
        assert_eq!(cfg.transfer_timeout, Some(Duration::from_millis(250)));
        assert_eq!(cfg.chunk_size, 64);
        assert_eq!(cfg.log_level, LogLevel::Debug);
    }

    #[test]
    fn unset_flags_keep_config_values() {
        let args = Args::try_parse_from(["ext_sorter"]).unwrap();
        let mut cfg = Config::new("/cfg-in", "/cfg-out");
        cfg.follow_symlinks = true;
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.source_dir, PathBuf::from("/cfg-in"));
        assert!(cfg.follow_symlinks);
        assert!(cfg.max_concurrent_transfers.is_none());
    }
}
