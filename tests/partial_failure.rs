use assert_fs::TempDir;
use assert_fs::prelude::*;
use ext_sorter::{
    BatchCoordinator, BatchObserver, BatchOptions, BatchPhase, ErrorKind, SortError,
    TraversalError,
};
use std::fs;
use std::path::PathBuf;

/// Removes one source file after the walk has seen it but before any copy starts.
struct VanishBeforeDispatch(PathBuf);

impl BatchObserver for VanishBeforeDispatch {
    fn on_phase(&self, phase: BatchPhase) {
        if phase == BatchPhase::Dispatching {
            fs::remove_file(&self.0).unwrap();
        }
    }
}

#[test]
fn one_vanished_file_does_not_affect_siblings() {
    let temp = TempDir::new().unwrap();
    for i in 0..8 {
        temp.child(format!("in/f{i}.txt")).write_str("ok").unwrap();
    }
    let victim = temp.path().join("in/f3.txt");
    let observer = VanishBeforeDispatch(victim.clone());

    let report = BatchCoordinator::new(BatchOptions::default())
        .with_observer(&observer)
        .run(&temp.path().join("in"), &temp.path().join("out"))
        .unwrap();

    assert_eq!(report.total_seen, 8);
    assert_eq!(report.succeeded, 7);
    assert_eq!(report.failed, 1);
    let failure = &report.failures[0];
    assert_eq!(failure.source_path, victim);
    assert_eq!(failure.dest_path, temp.path().join("out/txt/f3.txt"));
    assert_eq!(failure.kind, ErrorKind::Open);
    assert!(!temp.path().join("out/txt/f3.txt").exists());
    assert!(temp.path().join("out/txt/f7.txt").is_file());
}

#[test]
fn missing_source_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let err = ext_sorter::run(
        &temp.path().join("nope"),
        &temp.path().join("out"),
        BatchOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SortError::Traversal(TraversalError::NotFound(_))));
    assert_eq!(err.code(), 2);
    assert!(!temp.path().join("out").exists());
}

#[test]
fn file_blocking_one_category_fails_only_that_category() {
    let temp = TempDir::new().unwrap();
    temp.child("in/a.txt").write_str("a").unwrap();
    temp.child("in/b.txt").write_str("b").unwrap();
    temp.child("in/c.md").write_str("c").unwrap();
    // A plain file where the txt category directory should go.
    temp.child("out/txt").write_str("in the way").unwrap();

    let report = ext_sorter::run(
        &temp.path().join("in"),
        &temp.path().join("out"),
        BatchOptions::default(),
    )
    .unwrap();

    assert_eq!(report.total_seen, 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 2);
    assert!(report.failures.iter().all(|f| f.kind == ErrorKind::Provision));
    let failed: Vec<_> = report.failures.iter().map(|f| f.source_path.clone()).collect();
    assert_eq!(
        failed,
        vec![temp.path().join("in/a.txt"), temp.path().join("in/b.txt")]
    );
    temp.child("out/md/c.md").assert("c");
}
