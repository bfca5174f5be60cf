//! Core library for `ext_sorter`.
//!
//! Copies every regular file under a source tree into
//! `<dest>/<extension>/<file name>`, one concurrent transfer per file.
//! A failed file is recorded in the `BatchReport` and never stops its
//! siblings; only an unusable source or destination root aborts a run.
//!
//! ```no_run
//! use ext_sorter::{BatchOptions, run};
//! use std::path::Path;
//!
//! let report = run(Path::new("/data/in"), Path::new("/data/sorted"), BatchOptions::default())?;
//! println!("{}", report.summary_line());
//! # Ok::<(), ext_sorter::SortError>(())
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod report;
pub mod shutdown;

pub use batch::{
    BatchCoordinator, BatchObserver, BatchOptions, BatchPhase, NoopObserver, TransferTask, run,
};
pub use config::{
    CONFIG_ENV_VAR, Config, LogLevel, default_config_path, default_log_path, load_config,
    load_config_from_xml_path, path_has_symlink_ancestor,
};
pub use errors::{ErrorKind, ProvisionError, SortError, TransferError, TraversalError};
pub use fs_ops::{
    Category, DirectoryProvisioner, NO_EXTENSION, SourceEntry, TransferOptions, TransferOutcome,
    classify, transfer, traverse,
};
pub use report::{BatchReport, FailureEntry};
pub use shutdown::CancelToken;
