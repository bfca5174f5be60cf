//! Tracing initialization.
//! Builds a subscriber with EnvFilter, compact or JSON output on stderr, and
//! an optional non-blocking file layer.
//!
//! - Level comes from LogLevel only; RUST_LOG is not consulted.
//! - File logging is refused when any ancestor of the path is a symlink.

use anyhow::Result;
use chrono::Local;
use ext_sorter::fs_ops::helpers::io_error_with_help;
use ext_sorter::output as out;
use ext_sorter::platform::open_log_file_secure_append;
use ext_sorter::{LogLevel, default_log_path, path_has_symlink_ancestor};
use std::fmt as stdfmt;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

/// DD/MM/YY HH:MM:SS in local time.
struct LocalHumanTime;

impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

fn to_level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

fn env_filter_for(lvl: &LogLevel) -> EnvFilter {
    EnvFilter::default().add_directive(to_level_filter(lvl).into())
}

fn open_file_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(false) => {}
        Ok(true) => {
            out::print_warn(&format!(
                "refusing to log to {}: an ancestor is a symlink",
                path.display()
            ));
            return None;
        }
        Err(e) => {
            out::print_warn(&format!(
                "could not check log path {} for symlinks: {e}",
                path.display()
            ));
            return None;
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && let Err(e) =
            std::fs::create_dir_all(parent).map_err(io_error_with_help("create log directory", parent))
    {
        out::print_warn(&format!("{e:#}"));
        return None;
    }

    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            out::print_warn(&format!("failed to open log file {}: {e}", path.display()));
            None
        }
    }
}

/// Install the global subscriber. The returned guard flushes the file layer
/// when dropped and must be held until shutdown.
pub fn init_tracing(
    lvl: &LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let file = log_file.and_then(|p| {
        let opened = open_file_writer(p);
        if opened.is_none()
            && let Ok(def) = default_log_path()
        {
            out::print_info(&format!(
                "file logging disabled; the default log path is {}",
                def.display()
            ));
        }
        opened
    });
    let (writer, guard) = match file {
        Some((w, g)) => (Some(w), Some(g)),
        None => (None, None),
    };

    let filter = env_filter_for(lvl);
    if json {
        let console = tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_thread_names(true)
            .with_writer(std::io::stderr);
        let file_layer = writer.map(|w| {
            tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_thread_names(true)
                .with_writer(w)
        });
        registry()
            .with(filter)
            .with(console)
            .with(file_layer)
            .try_init()?;
    } else {
        let console = tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_target(false)
            .with_thread_names(true)
            .compact()
            .with_writer(std::io::stderr);
        let file_layer = writer.map(|w| {
            tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_target(false)
                .with_thread_names(true)
                .with_ansi(false)
                .compact()
                .with_writer(w)
        });
        registry()
            .with(filter)
            .with(console)
            .with(file_layer)
            .try_init()?;
    }
    Ok(guard)
}
