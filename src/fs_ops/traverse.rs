//! Source tree traversal.
//!
//! `traverse` validates the root once, then hands back a lazy, single-pass
//! iterator over regular files. walkdir keeps its own explicit stack of open
//! directories, so depth does not grow the call stack.
//!
//! Symlinks:
//! - not following (default): symlinked directories are neither reported nor
//!   descended into, so cycles are impossible; symlinks to regular files are
//!   reported as files.
//! - following: walkdir tracks ancestors and reports a loop as a per-entry
//!   error, which is recorded and skipped.
//!
//! Per-entry errors (unreadable subdirectory, vanished entry, loop) never stop
//! the walk; they are collected in `skipped()`.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::TraversalError;
use crate::shutdown::CancelToken;

/// One discovered regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    /// Logical discovery time: 0 for the first file yielded, then 1, 2, ...
    pub seq: u64,
    /// Size reported by the walk (informational; the transfer re-reads it at open).
    pub len: u64,
}

impl SourceEntry {
    /// Final path component; source entries always have one.
    pub fn file_name(&self) -> &std::ffi::OsStr {
        self.path.file_name().unwrap_or(self.path.as_os_str())
    }
}

/// An entry the walk could not read and moved past.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct TraverseOptions {
    pub follow_symlinks: bool,
    pub cancel: CancelToken,
}

/// Lazy walk over the regular files under a root.
pub struct Traversal {
    walker: walkdir::IntoIter,
    next_seq: u64,
    skipped: Vec<SkippedEntry>,
    cancel: CancelToken,
}

/// Validate `root` and start walking it.
pub fn traverse(root: &Path, opts: &TraverseOptions) -> Result<Traversal, TraversalError> {
    let meta = fs::metadata(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TraversalError::NotFound(root.to_path_buf()),
        _ => TraversalError::Unreadable {
            path: root.to_path_buf(),
            source: e,
        },
    })?;
    if !meta.is_dir() {
        return Err(TraversalError::NotADirectory(root.to_path_buf()));
    }
    // Check readability up front so an unreadable root is fatal, not "skipped".
    fs::read_dir(root).map_err(|source| TraversalError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(opts.follow_symlinks)
        .sort_by_file_name()
        .into_iter();
    debug!(root = %root.display(), follow_symlinks = opts.follow_symlinks, "traversal started");
    Ok(Traversal {
        walker,
        next_seq: 0,
        skipped: Vec::new(),
        cancel: opts.cancel.clone(),
    })
}

impl Traversal {
    /// Entries skipped so far.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    pub fn into_skipped(self) -> Vec<SkippedEntry> {
        self.skipped
    }

    fn record(&mut self, err: walkdir::Error) {
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let message = if err.loop_ancestor().is_some() {
            format!("symlink loop at '{}'", path.display())
        } else {
            err.to_string()
        };
        self.skip(path, message);
    }

    fn skip(&mut self, path: PathBuf, message: String) {
        warn!(path = %path.display(), %message, "Skipping unreadable entry");
        self.skipped.push(SkippedEntry { path, message });
    }
}

impl Iterator for Traversal {
    type Item = SourceEntry;

    fn next(&mut self) -> Option<SourceEntry> {
        loop {
            if self.cancel.is_requested() {
                return None;
            }
            let entry = match self.walker.next()? {
                Ok(e) => e,
                Err(err) => {
                    self.record(err);
                    continue;
                }
            };

            let ft = entry.file_type();
            let len = if ft.is_file() {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            } else if ft.is_symlink() {
                // Only reached when not following links. Keep links to files.
                match fs::metadata(entry.path()) {
                    Ok(m) if m.is_file() => m.len(),
                    Ok(_) => continue,
                    Err(e) => {
                        let path = entry.into_path();
                        let message = format!("unresolvable symlink: {e}");
                        self.skip(path, message);
                        continue;
                    }
                }
            } else {
                continue;
            };

            let seq = self.next_seq;
            self.next_seq += 1;
            return Some(SourceEntry {
                path: entry.into_path(),
                seq,
                len,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn yields_only_files_in_name_order() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("b.txt").write_str("b").unwrap();
        temp.child("a.txt").write_str("a").unwrap();
        temp.child("sub/deeper/c").write_str("c").unwrap();
        temp.child("empty_dir").create_dir_all().unwrap();

        let walk = traverse(temp.path(), &TraverseOptions::default()).unwrap();
        let got: Vec<_> = walk.collect();
        let names: Vec<_> = got
            .iter()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c"]);
        let seqs: Vec<_> = got.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(got[0].len, 1);
    }

    #[test]
    fn missing_root_is_fatal() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = traverse(&temp.path().join("nope"), &TraverseOptions::default())
            .err()
            .expect("expected error");
        assert!(matches!(err, TraversalError::NotFound(_)));
    }

    #[test]
    fn file_root_is_fatal() {
        let temp = assert_fs::TempDir::new().unwrap();
        let f = temp.child("file.txt");
        f.write_str("x").unwrap();
        let err = traverse(f.path(), &TraverseOptions::default())
            .err()
            .expect("expected error");
        assert!(matches!(err, TraversalError::NotADirectory(_)));
    }

    #[test]
    fn cancelled_walk_stops_yielding() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.txt").write_str("a").unwrap();
        let opts = TraverseOptions::default();
        opts.cancel.request();
        assert_eq!(traverse(temp.path(), &opts).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_dirs_are_not_followed_by_default() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("real/x.txt").write_str("x").unwrap();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("real").join("loop")).unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("real").join("x.txt"),
            temp.path().join("link.txt"),
        )
        .unwrap();

        let walk = traverse(temp.path(), &TraverseOptions::default()).unwrap();
        let mut names: Vec<_> = walk
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["link.txt", "x.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_recorded_when_following() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("real/x.txt").write_str("x").unwrap();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("real").join("loop")).unwrap();

        let opts = TraverseOptions {
            follow_symlinks: true,
            ..TraverseOptions::default()
        };
        let mut walk = traverse(temp.path(), &opts).unwrap();
        let files: Vec<_> = walk.by_ref().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(walk.skipped().len(), 1);
        assert!(walk.skipped()[0].message.contains("loop"));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_recorded_not_dropped() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.txt").write_str("a").unwrap();
        let link = temp.path().join("dangling.txt");
        std::os::unix::fs::symlink(temp.path().join("gone.txt"), &link).unwrap();

        let mut walk = traverse(temp.path(), &TraverseOptions::default()).unwrap();
        let files: Vec<_> = walk.by_ref().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(walk.skipped().len(), 1);
        assert_eq!(walk.skipped()[0].path, link);
        assert!(walk.skipped()[0].message.contains("unresolvable symlink"));
    }
}
