//! Typed error definitions for ext_sorter.
//!
//! Three tiers, matching how far a failure is allowed to travel:
//! - `TraversalError`: the source root is unusable; the run never starts.
//! - `ProvisionError`: a category directory could not be made; every task in
//!   that category fails, other categories continue.
//! - `TransferError`: one file failed; recorded in the report and nothing else.
//!
//! `SortError` is the only error `batch::run` returns.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::fs_ops::helpers::describe_io_error;

#[derive(Debug, Error)]
pub enum TraversalError {
    #[error("Source root not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Source root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{}", describe_io_error("read source root", .path, .source))]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directory provisioning failure. Cheap to clone so one failure can be
/// attached to every task that shares the category.
#[derive(Debug, Clone, Error)]
pub enum ProvisionError {
    #[error("{}", describe_io_error("create category directory", .dir, .source))]
    Create {
        dir: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Category path exists but is not a directory: {}", .dir.display())]
    NotADirectory { dir: PathBuf },
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{}", describe_io_error("open source", .src, .source))]
    OpenSource {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}", describe_io_error("create staging file", .staged, .source))]
    CreateDestination {
        src: PathBuf,
        dest: PathBuf,
        staged: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}", describe_io_error("read", .src, .source))]
    Read {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}", describe_io_error("write", .dest, .source))]
    Write {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}", describe_io_error("rename staged copy into", .dest, .source))]
    Finalize {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Source {} shrank while copying: expected {expected} bytes, read {copied}", .src.display())]
    Truncated {
        src: PathBuf,
        dest: PathBuf,
        expected: u64,
        copied: u64,
    },

    #[error("Copy {} -> {} exceeded {timeout_ms} ms", .src.display(), .dest.display())]
    TimedOut {
        src: PathBuf,
        dest: PathBuf,
        timeout_ms: u128,
    },

    #[error("Copy {} -> {} cancelled", .src.display(), .dest.display())]
    Cancelled { src: PathBuf, dest: PathBuf },

    #[error("{source}")]
    Provision {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: ProvisionError,
    },
}

/// Flat classification of a `TransferError`, stable for renderers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Provision,
    Open,
    Read,
    Write,
    Finalize,
    Truncated,
    Timeout,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Provision => "provision",
            ErrorKind::Open => "open",
            ErrorKind::Read => "read",
            ErrorKind::Write => "write",
            ErrorKind::Finalize => "finalize",
            ErrorKind::Truncated => "truncated",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::OpenSource { .. } => ErrorKind::Open,
            TransferError::CreateDestination { .. } | TransferError::Write { .. } => {
                ErrorKind::Write
            }
            TransferError::Read { .. } => ErrorKind::Read,
            TransferError::Finalize { .. } => ErrorKind::Finalize,
            TransferError::Truncated { .. } => ErrorKind::Truncated,
            TransferError::TimedOut { .. } => ErrorKind::Timeout,
            TransferError::Cancelled { .. } => ErrorKind::Cancelled,
            TransferError::Provision { .. } => ErrorKind::Provision,
        }
    }

    /// Source path of the failed transfer.
    pub fn src(&self) -> &PathBuf {
        match self {
            TransferError::OpenSource { src, .. }
            | TransferError::CreateDestination { src, .. }
            | TransferError::Read { src, .. }
            | TransferError::Write { src, .. }
            | TransferError::Finalize { src, .. }
            | TransferError::Truncated { src, .. }
            | TransferError::TimedOut { src, .. }
            | TransferError::Cancelled { src, .. }
            | TransferError::Provision { src, .. } => src,
        }
    }

    /// Final destination path of the failed transfer.
    pub fn dest(&self) -> &PathBuf {
        match self {
            TransferError::OpenSource { dest, .. }
            | TransferError::CreateDestination { dest, .. }
            | TransferError::Read { dest, .. }
            | TransferError::Write { dest, .. }
            | TransferError::Finalize { dest, .. }
            | TransferError::Truncated { dest, .. }
            | TransferError::TimedOut { dest, .. }
            | TransferError::Cancelled { dest, .. }
            | TransferError::Provision { dest, .. } => dest,
        }
    }
}

/// Fatal, run-level failures. Nothing was attempted when one of these is returned.
#[derive(Debug, Error)]
pub enum SortError {
    #[error(transparent)]
    Traversal(#[from] TraversalError),

    #[error("{}", describe_io_error("prepare destination root", .path, .source))]
    DestinationRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SortError {
    /// Stable process exit code per failure class.
    pub fn code(&self) -> i32 {
        match self {
            SortError::Traversal(_) => 2,
            SortError::DestinationRoot { .. } => 3,
        }
    }
}
