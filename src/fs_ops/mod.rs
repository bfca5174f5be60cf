//! Filesystem operations used by a batch: classification, directory
//! provisioning, chunked transfer and the source walk.

pub mod classify;
pub mod helpers;
pub mod provision;
pub mod transfer;
pub mod traverse;
pub mod util;

pub use classify::{Category, NO_EXTENSION, classify, classify_os};
pub use provision::{DirectoryProvisioner, ProvisionedDir};
pub use transfer::{DEFAULT_CHUNK_SIZE, TransferOptions, TransferOutcome, transfer};
pub use traverse::{SkippedEntry, SourceEntry, Traversal, TraverseOptions, traverse};
