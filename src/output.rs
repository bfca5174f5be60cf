//! User-facing console lines.
//! Colours are enabled only when the stream is a TTY.

use owo_colors::OwoColorize;

use crate::report::BatchReport;

fn stdout_is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_is_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_info(msg: &str) {
    if stdout_is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if stdout_is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Final summary: one line per failure and skipped entry, then the counters.
/// The summary goes to stdout so scripts can parse it; problems go to stderr.
pub fn print_report(report: &BatchReport) {
    for line in report.failure_lines() {
        print_error(&line);
    }
    for skipped in &report.skipped_entries {
        print_warn(&format!(
            "skipped '{}': {}",
            skipped.path.display(),
            skipped.message
        ));
    }
    for dest in &report.collisions {
        print_warn(&format!(
            "several sources share {}; only the last copy was kept",
            dest.display()
        ));
    }
    if report.cancelled {
        print_warn("run was cancelled; unstarted files are reported as failed");
    }
    if report.failed == 0 {
        print_success(&report.summary_line());
    } else {
        print_info(&report.summary_line());
    }
}
