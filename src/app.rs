//! Application orchestrator.
//! Loads and merges config, initializes logging, installs the interrupt
//! handler, validates paths, runs one batch and renders the report.
//!
//! Exit codes: 0 all files copied, 1 some files failed, 2 unusable config or
//! source, 3 unusable destination root, 130 interrupted.

use anyhow::Result;
use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

use ext_sorter::cli::Args;
use ext_sorter::output as out;
use ext_sorter::{
    BatchCoordinator, BatchObserver, BatchOptions, CONFIG_ENV_VAR, CancelToken, Config, LogLevel,
    TransferOutcome, TransferTask, default_config_path, load_config,
};

use crate::logging::init_tracing;

const EXIT_FAILURES: i32 = 1;
const EXIT_INVALID_CONFIG: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

/// Console rendering of batch events. Failures are left to the final report.
struct ConsoleObserver {
    quiet: bool,
    done: AtomicU64,
}

impl BatchObserver for ConsoleObserver {
    fn on_directory_created(&self, dir: &Path) {
        if !self.quiet {
            out::print_info(&format!("created {}", dir.display()));
        }
    }

    fn on_transfer(&self, task: &TransferTask, outcome: &TransferOutcome) {
        let n = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if self.quiet {
            return;
        }
        if let TransferOutcome::Success { bytes } = outcome {
            out::print_success(&format!(
                "[{n}] {} -> {} ({bytes} bytes)",
                task.entry.path.display(),
                task.dest.display()
            ));
        }
    }
}

fn print_config_location(explicit: Option<&Path>) {
    if let Some(p) = explicit {
        out::print_info(&format!("Using --config:\n  {}", p.display()));
        return;
    }
    if let Some(p) = env::var_os(CONFIG_ENV_VAR) {
        out::print_info(&format!(
            "Using {CONFIG_ENV_VAR} (explicit):\n  {}",
            Path::new(&p).display()
        ));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default ext_sorter config path:\n  {}", p.display()));
            if !p.exists() {
                out::print_info("No config file exists there; built-in defaults apply.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

/// Run the CLI application and return the process exit code.
pub fn run(args: Args) -> Result<i32> {
    if args.print_config {
        print_config_location(args.config.as_deref());
        return Ok(0);
    }

    // Config file first, then CLI flags on top.
    let mut cfg = match load_config(args.config.as_deref()) {
        Ok(loaded) => loaded.unwrap_or_default(),
        Err(e) => {
            out::print_error(&format!("{e:#}"));
            return Ok(EXIT_INVALID_CONFIG);
        }
    };
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json)
        .inspect_err(|e| out::print_error(&format!("Failed to initialize logging: {e}")))?;

    // The guard stays here: the batch keeps logging after an interrupt.
    let cancel = CancelToken::new();
    if let Err(e) = ctrlc::set_handler(interrupt_handler(cancel.clone())) {
        out::print_warn(&format!("could not install interrupt handler: {e}"));
    }

    debug!(?cfg, "Starting ext_sorter");
    let code = sort(&cfg, cancel);

    // Flush file logs only after the batch has reported.
    drop(guard);
    Ok(code)
}

/// Ctrl-C only requests cancellation; in-flight copies stop at their next
/// chunk and the run still reports.
fn interrupt_handler(cancel: CancelToken) -> impl FnMut() + Send + 'static {
    move || {
        if cancel.is_requested() {
            return;
        }
        cancel.request();
        out::print_warn("Received interrupt; finishing in-flight copies...");
    }
}

fn sort(cfg: &Config, cancel: CancelToken) -> i32 {
    if let Err(e) = cfg.validate() {
        error!(error = %format!("{e:#}"), "Invalid configuration");
        out::print_error(&format!("{e:#}"));
        return EXIT_INVALID_CONFIG;
    }

    let observer = ConsoleObserver {
        quiet: cfg.log_level == LogLevel::Quiet,
        done: AtomicU64::new(0),
    };
    let opts = BatchOptions {
        cancel,
        ..BatchOptions::from(cfg)
    };
    let report = match BatchCoordinator::new(opts)
        .with_observer(&observer)
        .run(&cfg.source_dir, &cfg.dest_dir)
    {
        Ok(r) => r,
        Err(e) => {
            error!(code = e.code(), error = %e, "Sort aborted");
            out::print_error(&e.to_string());
            return e.code();
        }
    };

    out::print_report(&report);
    if report.cancelled {
        EXIT_INTERRUPTED
    } else if report.failed > 0 {
        EXIT_FAILURES
    } else {
        0
    }
}
