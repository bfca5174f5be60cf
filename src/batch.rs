//! Batch coordination.
//!
//! A batch walks the source tree to completion, turns every discovered file
//! into a `TransferTask`, then spawns one unit of work per task onto a rayon
//! pool inside a single `scope`. The scope is the join point: it does not
//! return until every spawned task has produced its outcome, so no result is
//! dropped and nothing is fire-and-forget.
//!
//! Phases: Idle -> Traversing -> Dispatching -> AwaitingCompletion -> Reported.
//!
//! Failure policy:
//! - unusable source root or destination root: `SortError`, no report;
//! - provisioning failure: every task in that category fails, others proceed;
//! - transfer failure: recorded for that file only.
//!
//! Nothing is retried.

use rayon::ThreadPoolBuilder;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::{SortError, TransferError};
use crate::fs_ops::classify::{Category, classify_os};
use crate::fs_ops::provision::DirectoryProvisioner;
use crate::fs_ops::transfer::{DEFAULT_CHUNK_SIZE, TransferOptions, TransferOutcome, transfer};
use crate::fs_ops::traverse::{SourceEntry, TraverseOptions, traverse};
use crate::report::{BatchReport, ReportBuilder};
use crate::shutdown::CancelToken;

/// Lifecycle of one batch. `Reported` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    Traversing,
    Dispatching,
    AwaitingCompletion,
    Reported,
}

/// One file paired with where it is going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    pub entry: SourceEntry,
    pub category: Category,
    /// `dest_root/<category>/<file name>`
    pub dest: PathBuf,
}

impl TransferTask {
    pub fn new(entry: SourceEntry, dest_root: &Path) -> Self {
        let category = classify_os(entry.file_name());
        let dest = dest_root.join(category.as_str()).join(entry.file_name());
        Self {
            entry,
            category,
            dest,
        }
    }
}

/// Event sink for a running batch. Called from worker threads.
pub trait BatchObserver: Sync {
    fn on_phase(&self, _phase: BatchPhase) {}
    fn on_directory_created(&self, _dir: &Path) {}
    fn on_transfer(&self, _task: &TransferTask, _outcome: &TransferOutcome) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Tunables for a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub chunk_size: usize,
    /// Cap on transfers running at once; `Some(n)` uses a dedicated pool of
    /// `n` workers.
    ///
    /// `None` spawns every task up front onto rayon's global pool. Nothing
    /// throttles dispatch, but at most one transfer runs per global-pool
    /// thread (the number of logical CPUs unless `RAYON_NUM_THREADS` is set).
    pub max_concurrent_transfers: Option<usize>,
    pub transfer_timeout: Option<Duration>,
    pub follow_symlinks: bool,
    pub cancel: CancelToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_transfers: None,
            transfer_timeout: None,
            follow_symlinks: false,
            cancel: CancelToken::new(),
        }
    }
}

impl From<&Config> for BatchOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            chunk_size: cfg.chunk_size,
            max_concurrent_transfers: cfg.max_concurrent_transfers,
            transfer_timeout: cfg.transfer_timeout,
            follow_symlinks: cfg.follow_symlinks,
            cancel: CancelToken::new(),
        }
    }
}

/// Drives one batch from walk to report.
pub struct BatchCoordinator<'o> {
    opts: BatchOptions,
    observer: &'o dyn BatchObserver,
}

impl BatchCoordinator<'static> {
    pub fn new(opts: BatchOptions) -> Self {
        Self {
            opts,
            observer: &NoopObserver,
        }
    }
}

impl<'o> BatchCoordinator<'o> {
    pub fn with_observer<'n>(self, observer: &'n dyn BatchObserver) -> BatchCoordinator<'n> {
        BatchCoordinator {
            opts: self.opts,
            observer,
        }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.opts
    }

    /// Sort every regular file under `source` into `dest/<category>/`.
    pub fn run(&self, source: &Path, dest: &Path) -> Result<BatchReport, SortError> {
        let started = Instant::now();
        let observer = self.observer;
        observer.on_phase(BatchPhase::Idle);

        observer.on_phase(BatchPhase::Traversing);
        let walk = traverse(
            source,
            &TraverseOptions {
                follow_symlinks: self.opts.follow_symlinks,
                cancel: self.opts.cancel.clone(),
            },
        )?;
        prepare_dest_root(dest)?;

        let mut builder = ReportBuilder::default();
        let mut targets: HashSet<PathBuf> = HashSet::new();
        let mut planned_bytes: u64 = 0;
        let mut walk = walk;
        let tasks: Vec<TransferTask> = walk
            .by_ref()
            .map(|entry| {
                let task = TransferTask::new(entry, dest);
                debug!(
                    src = %task.entry.path.display(),
                    category = %task.category,
                    len = task.entry.len,
                    "discovered"
                );
                planned_bytes += task.entry.len;
                if !targets.insert(task.dest.clone()) {
                    // Last writer wins; make the overwrite visible.
                    warn!(
                        src = %task.entry.path.display(),
                        dest = %task.dest.display(),
                        "Destination shared with an earlier file; the last copy to finish is kept"
                    );
                    builder.add_collision(&task.dest);
                }
                task
            })
            .collect();
        let skipped = walk.into_skipped();
        info!(
            source = %source.display(),
            files = tasks.len(),
            planned_bytes,
            skipped = skipped.len(),
            "Traversal finished"
        );

        builder.add_seen(tasks.len() as u64);

        let provisioner = DirectoryProvisioner::new(dest);
        let transfer_opts = TransferOptions {
            chunk_size: self.opts.chunk_size,
            timeout: self.opts.transfer_timeout,
            cancel: self.opts.cancel.clone(),
        };
        let results: Mutex<Vec<(TransferTask, TransferOutcome)>> =
            Mutex::new(Vec::with_capacity(tasks.len()));

        observer.on_phase(BatchPhase::Dispatching);
        let dispatch = || {
            rayon::scope(|s| {
                for task in tasks {
                    let provisioner = &provisioner;
                    let transfer_opts = &transfer_opts;
                    let results = &results;
                    s.spawn(move |_| {
                        let outcome = run_task(&task, provisioner, transfer_opts, observer);
                        observer.on_transfer(&task, &outcome);
                        let mut guard = match results.lock() {
                            Ok(g) => g,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        guard.push((task, outcome));
                    });
                }
                observer.on_phase(BatchPhase::AwaitingCompletion);
            })
        };
        match self.build_pool() {
            Some(pool) => pool.install(dispatch),
            None => dispatch(),
        }

        let results = match results.into_inner() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (task, outcome) in &results {
            builder.add_outcome(
                task.entry.seq,
                &task.category,
                &task.entry.path,
                &task.dest,
                outcome,
            );
        }

        let report = builder.build(
            skipped,
            started.elapsed(),
            self.opts.cancel.is_requested(),
        );
        info!(
            seen = report.total_seen,
            succeeded = report.succeeded,
            failed = report.failed,
            bytes = report.bytes_copied,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch finished"
        );
        observer.on_phase(BatchPhase::Reported);
        Ok(report)
    }

    /// Dedicated pool when a cap is configured; None means the global pool.
    fn build_pool(&self) -> Option<rayon::ThreadPool> {
        let n = self.opts.max_concurrent_transfers?;
        match ThreadPoolBuilder::new()
            .num_threads(n.max(1))
            .thread_name(|i| format!("ext-sorter-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(workers = n, error = %e, "Failed to build capped pool; using the global pool");
                None
            }
        }
    }
}

/// Convenience wrapper: run one batch with default observer.
pub fn run(source: &Path, dest: &Path, opts: BatchOptions) -> Result<BatchReport, SortError> {
    BatchCoordinator::new(opts).run(source, dest)
}

/// Create the destination root if absent; it must end up a directory.
fn prepare_dest_root(dest: &Path) -> Result<(), SortError> {
    fs::create_dir_all(dest).map_err(|source| SortError::DestinationRoot {
        path: dest.to_path_buf(),
        source,
    })?;
    if !dest.is_dir() {
        return Err(SortError::DestinationRoot {
            path: dest.to_path_buf(),
            source: io::Error::other("not a directory"),
        });
    }
    Ok(())
}

/// Provision, then copy. Always returns a terminal outcome.
fn run_task(
    task: &TransferTask,
    provisioner: &DirectoryProvisioner,
    opts: &TransferOptions,
    observer: &dyn BatchObserver,
) -> TransferOutcome {
    let src = &task.entry.path;
    let dest = &task.dest;

    if opts.cancel.is_requested() {
        return TransferOutcome::Failure(TransferError::Cancelled {
            src: src.clone(),
            dest: dest.clone(),
        });
    }

    let outcome = match provisioner.ensure(&task.category) {
        Ok(dir) => {
            if dir.created {
                observer.on_directory_created(&dir.path);
            }
            transfer(src, dest, opts)
        }
        Err(source) => TransferOutcome::Failure(TransferError::Provision {
            src: src.clone(),
            dest: dest.clone(),
            source,
        }),
    };

    match &outcome {
        TransferOutcome::Success { bytes } => {
            info!(src = %src.display(), dest = %dest.display(), bytes = *bytes, "Copied");
        }
        TransferOutcome::Failure(e) => {
            error!(src = %src.display(), dest = %dest.display(), kind = %e.kind(), error = %e, "Copy failed");
        }
    }
    outcome
}
