//! Chunked single-file transfer.
//!
//! Features:
//! - Streams `src` into a hidden staging file next to `dest` in fixed-size
//!   chunks, then renames it over `dest`. Peak memory per transfer is one chunk.
//! - Snapshot semantics: the byte count is fixed by the source size observed
//!   at open time. Growth after open is ignored; shrinking is a failure.
//! - Timeout and cancellation are checked before every chunk.
//! - Both handles are closed and the staging file removed on every failure
//!   path, so a failed transfer never leaves a partial `dest`.
//!
//! Collision policy: last writer wins. Two transfers targeting the same `dest`
//! each stage privately; whichever renames last owns the final file, and the
//! file is always one complete copy.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::trace;

use super::util;
use crate::errors::TransferError;
use crate::shutdown::CancelToken;

/// Default chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Knobs for one transfer.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub chunk_size: usize,
    pub timeout: Option<Duration>,
    pub cancel: CancelToken,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: None,
            cancel: CancelToken::new(),
        }
    }
}

/// Terminal result of one transfer.
#[derive(Debug)]
pub enum TransferOutcome {
    Success { bytes: u64 },
    Failure(TransferError),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success { .. })
    }

    pub fn bytes(&self) -> Option<u64> {
        match self {
            TransferOutcome::Success { bytes } => Some(*bytes),
            TransferOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TransferError> {
        match self {
            TransferOutcome::Success { .. } => None,
            TransferOutcome::Failure(e) => Some(e),
        }
    }
}

impl From<Result<u64, TransferError>> for TransferOutcome {
    fn from(res: Result<u64, TransferError>) -> Self {
        match res {
            Ok(bytes) => TransferOutcome::Success { bytes },
            Err(e) => TransferOutcome::Failure(e),
        }
    }
}

/// Copy `src` to `dest`. The parent of `dest` must already exist.
pub fn transfer(src: &Path, dest: &Path, opts: &TransferOptions) -> TransferOutcome {
    copy_staged(src, dest, opts).into()
}

/// Staging file removed on drop unless committed.
struct Staged {
    path: PathBuf,
    committed: bool,
}

impl Drop for Staged {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn copy_staged(src: &Path, dest: &Path, opts: &TransferOptions) -> Result<u64, TransferError> {
    let started = Instant::now();
    checkpoint(src, dest, opts, started)?;

    let mut reader = File::open(src).map_err(|source| TransferError::OpenSource {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source,
    })?;
    let expected = reader
        .metadata()
        .map_err(|source| TransferError::Read {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            source,
        })?
        .len();

    let dest_dir = dest.parent().unwrap_or_else(|| Path::new("."));
    // Declared before `writer` so the handle is closed before the guard removes the file.
    let mut staged = Staged {
        path: util::unique_temp_path(dest_dir),
        committed: false,
    };
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&staged.path)
        .map_err(|source| TransferError::CreateDestination {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            staged: staged.path.clone(),
            source,
        })?;

    let mut buf = vec![0u8; opts.chunk_size.max(1)];
    let mut limited = (&mut reader).take(expected);
    let mut copied: u64 = 0;
    loop {
        checkpoint(src, dest, opts, started)?;
        let n = match limited.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(TransferError::Read {
                    src: src.to_path_buf(),
                    dest: dest.to_path_buf(),
                    source,
                });
            }
        };
        writer
            .write_all(&buf[..n])
            .map_err(|source| TransferError::Write {
                src: src.to_path_buf(),
                dest: dest.to_path_buf(),
                source,
            })?;
        copied += n as u64;
    }

    if copied < expected {
        return Err(TransferError::Truncated {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            expected,
            copied,
        });
    }

    writer.flush().map_err(|source| TransferError::Write {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source,
    })?;
    drop(writer);
    drop(reader);

    fs::rename(&staged.path, dest).map_err(|source| TransferError::Finalize {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source,
    })?;
    staged.committed = true;

    trace!(src = %src.display(), dest = %dest.display(), bytes = copied, elapsed_ms = started.elapsed().as_millis() as u64, "transfer finished");
    Ok(copied)
}

/// Fail fast on cancellation or an exceeded deadline.
fn checkpoint(
    src: &Path,
    dest: &Path,
    opts: &TransferOptions,
    started: Instant,
) -> Result<(), TransferError> {
    if opts.cancel.is_requested() {
        return Err(TransferError::Cancelled {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }
    if let Some(limit) = opts.timeout
        && started.elapsed() >= limit
    {
        return Err(TransferError::TimedOut {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            timeout_ms: limit.as_millis(),
        });
    }
    Ok(())
}
