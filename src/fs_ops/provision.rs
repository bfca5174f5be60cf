//! Category directory provisioning.
//!
//! Each category directory is created at most once per run. Concurrent callers
//! asking for the same category block on a per-category `OnceLock`; the first
//! caller performs the `create_dir_all` and every caller observes the same
//! outcome, including a cached failure.
//!
//! The map lock is only held to look up/insert the slot, never across I/O, so
//! distinct categories provision in parallel.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info};

use super::classify::Category;
use crate::errors::ProvisionError;

/// A category directory known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedDir {
    pub path: PathBuf,
    /// True only for the call that physically created the directory.
    pub created: bool,
}

type Slot = Arc<OnceLock<Result<PathBuf, ProvisionError>>>;

/// Shared set of provisioned categories under one destination root.
#[derive(Debug)]
pub struct DirectoryProvisioner {
    root: PathBuf,
    slots: Mutex<HashMap<Category, Slot>>,
}

impl DirectoryProvisioner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure `root/category` exists and is a directory.
    pub fn ensure(&self, category: &Category) -> Result<ProvisionedDir, ProvisionError> {
        let slot = self.slot_for(category);
        let mut created = false;
        let outcome = slot.get_or_init(|| {
            let dir = self.root.join(category.as_str());
            let res = create_category_dir(&dir);
            if let Ok(true) = res {
                created = true;
            }
            res.map(|_| dir)
        });
        match outcome {
            Ok(path) => Ok(ProvisionedDir {
                path: path.clone(),
                created,
            }),
            Err(e) => Err(e.clone()),
        }
    }

    /// Categories whose directory is known to exist.
    pub fn provisioned(&self) -> Vec<Category> {
        let slots = match self.slots.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut out: Vec<Category> = slots
            .iter()
            .filter(|(_, slot)| matches!(slot.get(), Some(Ok(_))))
            .map(|(c, _)| c.clone())
            .collect();
        out.sort();
        out
    }

    fn slot_for(&self, category: &Category) -> Slot {
        // A panic while holding the map lock cannot leave the map inconsistent.
        let mut slots = match self.slots.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(slots.entry(category.clone()).or_default())
    }
}

/// Create `dir` (and parents). Ok(true) if we created it, Ok(false) if it was
/// already there. "Already exists" is success as long as it is a directory.
fn create_category_dir(dir: &Path) -> Result<bool, ProvisionError> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            debug!(dir = %dir.display(), "category directory already present");
            return Ok(false);
        }
        Ok(_) => {
            // Allow a symlink that resolves to a directory.
            if fs::metadata(dir).map(|m| m.is_dir()).unwrap_or(false) {
                return Ok(false);
            }
            return Err(ProvisionError::NotADirectory {
                dir: dir.to_path_buf(),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(ProvisionError::Create {
                dir: dir.to_path_buf(),
                source: Arc::new(e),
            });
        }
    }

    match fs::create_dir_all(dir) {
        Ok(()) => {}
        // Lost a race with another process; fine if it made a directory.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => return Ok(false),
        Err(e) => {
            return Err(ProvisionError::Create {
                dir: dir.to_path_buf(),
                source: Arc::new(e),
            });
        }
    }
    if !dir.is_dir() {
        return Err(ProvisionError::NotADirectory {
            dir: dir.to_path_buf(),
        });
    }
    info!(dir = %dir.display(), "Created category directory");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::classify::classify;
    use tempfile::tempdir;

    #[test]
    fn creates_once_then_reports_existing() {
        let td = tempdir().unwrap();
        let p = DirectoryProvisioner::new(td.path());
        let cat = classify("a.txt");

        let first = p.ensure(&cat).unwrap();
        assert!(first.created);
        assert!(first.path.is_dir());
        assert_eq!(first.path, td.path().join("txt"));

        let second = p.ensure(&cat).unwrap();
        assert!(!second.created);
        assert_eq!(second.path, first.path);
        assert_eq!(p.provisioned(), vec![cat]);
    }

    #[test]
    fn existing_directory_is_not_an_error() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("md")).unwrap();
        let p = DirectoryProvisioner::new(td.path());
        let dir = p.ensure(&classify("x.md")).unwrap();
        assert!(!dir.created);
    }

    #[test]
    fn file_in_the_way_fails_and_is_cached() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("log"), b"not a dir").unwrap();
        let p = DirectoryProvisioner::new(td.path());
        let cat = classify("app.log");

        let err = p.ensure(&cat).unwrap_err();
        assert!(matches!(err, ProvisionError::NotADirectory { .. }));

        // Removing the obstacle does not retry; the category stays failed for the run.
        fs::remove_file(td.path().join("log")).unwrap();
        assert!(p.ensure(&cat).is_err());
        assert!(p.provisioned().is_empty());
    }

    #[test]
    fn creates_missing_root_parents() {
        let td = tempdir().unwrap();
        let root = td.path().join("nested").join("out");
        let p = DirectoryProvisioner::new(&root);
        let dir = p.ensure(&classify("README")).unwrap();
        assert_eq!(dir.path, root.join("noext"));
        assert!(dir.path.is_dir());
    }
}
