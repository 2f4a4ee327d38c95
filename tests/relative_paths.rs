//! Organizing through a relative folder path.
//!
//! These tests change the process working directory, so they live in their own
//! test binary and run one after another.

use autosort::{ActivityLog, FileMapper, OrganizerService, StateStore};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Runs `test` with the working directory set to `dir`, then restores it.
fn in_dir<T>(dir: &Path, test: impl FnOnce() -> T) -> T {
    let previous = env::current_dir().expect("Failed to read working directory");
    env::set_current_dir(dir).expect("Failed to change working directory");
    let outcome = test();
    env::set_current_dir(previous).expect("Failed to restore working directory");
    outcome
}

fn service_in(data: &TempDir) -> OrganizerService {
    OrganizerService::new(
        FileMapper::default(),
        StateStore::new(data.path().join("organizer_state.json")),
        ActivityLog::new(data.path().join("organizer_log.txt")),
    )
}

#[test]
fn test_undo_from_another_directory_after_relative_organize() {
    let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let root = TempDir::new().expect("Failed to create temp directory");
    let elsewhere = TempDir::new().expect("Failed to create temp directory");
    let data = TempDir::new().expect("Failed to create temp directory");
    fs::create_dir(root.path().join("inbox")).unwrap();
    fs::write(root.path().join("inbox/a.jpg"), "jpeg").unwrap();
    fs::write(root.path().join("inbox/b.txt"), "text").unwrap();

    let service = service_in(&data);
    let result = in_dir(root.path(), || service.organize(Path::new("inbox")))
        .expect("organize failed");
    assert_eq!(result.moved_count, 2);

    let history = service.history();
    let batch = &history[0];
    assert!(batch.source_dir.is_absolute());
    assert!(batch.operations.iter().all(|op| op.destination_dir.is_absolute()));

    // A new process started somewhere else.
    let restarted = service_in(&data);
    let report = in_dir(elsewhere.path(), || restarted.undo_last()).expect("undo failed");

    assert_eq!(report.total_operations, 2);
    assert_eq!(report.restored_count, 2);
    assert!(report.skipped.is_empty());
    assert!(root.path().join("inbox/a.jpg").is_file());
    assert!(root.path().join("inbox/b.txt").is_file());
}

#[test]
fn test_relative_folder_is_saved_absolute() {
    let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let root = TempDir::new().expect("Failed to create temp directory");
    let data = TempDir::new().expect("Failed to create temp directory");
    fs::create_dir(root.path().join("inbox")).unwrap();

    let service = service_in(&data);
    in_dir(root.path(), || service.set_source_path(Path::new("inbox"))).expect("save failed");

    let saved = PathBuf::from(service.source_path());
    let expected = fs::canonicalize(root.path().join("inbox")).unwrap();
    assert_eq!(saved, expected);
}
