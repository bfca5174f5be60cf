//! Batch report model and its accumulator.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ErrorKind;
use crate::fs_ops::classify::Category;
use crate::fs_ops::transfer::TransferOutcome;
use crate::fs_ops::traverse::SkippedEntry;

/// One failed transfer, ready to render without re-deriving anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

/// Aggregate outcome of one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Regular files discovered by the walk.
    pub total_seen: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Failures in discovery order.
    pub failures: Vec<FailureEntry>,
    /// Sum of bytes over successful transfers.
    pub bytes_copied: u64,
    /// Entries the walk could not read.
    pub skipped_entries: Vec<SkippedEntry>,
    /// Categories that received at least one file.
    pub categories: Vec<Category>,
    pub elapsed: Duration,
    /// True if cancellation was requested during the run.
    pub cancelled: bool,
    /// Destinations targeted by more than one source, once per extra source.
    /// Only one copy survives at each of these paths.
    pub collisions: Vec<PathBuf>,
}

impl BatchReport {
    /// Nothing failed and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped_entries.is_empty()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "seen={} succeeded={} failed={} bytes={} skipped={}",
            self.total_seen,
            self.succeeded,
            self.failed,
            self.bytes_copied,
            self.skipped_entries.len()
        )
    }

    /// One human-readable line per failure.
    pub fn failure_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.failures.iter().map(|f| {
            format!(
                "[{}] {} -> {}: {}",
                f.kind,
                f.source_path.display(),
                f.dest_path.display(),
                f.message
            )
        })
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[SORT] {}", self.summary_line())
    }
}

/// Mutable accumulator fed one outcome at a time.
#[derive(Debug, Default)]
pub(crate) struct ReportBuilder {
    total_seen: u64,
    succeeded: u64,
    bytes_copied: u64,
    failures: Vec<(u64, FailureEntry)>,
    categories: BTreeSet<Category>,
    collisions: Vec<PathBuf>,
}

impl ReportBuilder {
    pub(crate) fn add_seen(&mut self, n: u64) {
        self.total_seen += n;
    }

    pub(crate) fn add_collision(&mut self, dest: &std::path::Path) {
        self.collisions.push(dest.to_path_buf());
    }

    pub(crate) fn add_outcome(
        &mut self,
        seq: u64,
        category: &Category,
        source_path: &std::path::Path,
        dest_path: &std::path::Path,
        outcome: &TransferOutcome,
    ) {
        match outcome {
            TransferOutcome::Success { bytes } => {
                self.succeeded += 1;
                self.bytes_copied += bytes;
                self.categories.insert(category.clone());
            }
            TransferOutcome::Failure(e) => self.failures.push((
                seq,
                FailureEntry {
                    source_path: source_path.to_path_buf(),
                    dest_path: dest_path.to_path_buf(),
                    kind: e.kind(),
                    message: e.to_string(),
                },
            )),
        }
    }

    pub(crate) fn build(
        mut self,
        skipped_entries: Vec<SkippedEntry>,
        elapsed: Duration,
        cancelled: bool,
    ) -> BatchReport {
        self.failures.sort_by_key(|(seq, _)| *seq);
        BatchReport {
            total_seen: self.total_seen,
            succeeded: self.succeeded,
            failed: self.failures.len() as u64,
            failures: self.failures.into_iter().map(|(_, f)| f).collect(),
            bytes_copied: self.bytes_copied,
            skipped_entries,
            categories: self.categories.into_iter().collect(),
            elapsed,
            cancelled,
            collisions: self.collisions,
        }
    }
}
