/// Undo of an organize batch.
///
/// This module moves the files of a recorded batch back from their category
/// directories into the directory they were organized from.
use crate::activity_log::ActivityLog;
use crate::file_organizer::{Batch, MoveOperation};
use crate::progress::ProgressSink;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of replaying one batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UndoResult {
    /// Number of operations in the batch.
    pub total_operations: usize,
    /// Number of files moved back.
    pub restored_count: usize,
    /// Files no longer where the batch left them (moved or deleted since).
    pub skipped: Vec<PathBuf>,
    /// Files that were present but could not be moved back.
    pub failed: Vec<(PathBuf, String)>,
}

impl UndoResult {
    /// Returns true if every file in the batch was restored.
    pub fn is_complete_success(&self) -> bool {
        self.restored_count == self.total_operations
    }
}

/// Moves the files of a recorded batch back where they came from.
pub struct UndoManager;

impl UndoManager {
    /// Moves every file of `batch` back to its original directory.
    ///
    /// Operations are replayed in recorded order. A file missing from its
    /// category directory is skipped silently; it is noted in
    /// `UndoResult::skipped` but not treated as an error.
    ///
    /// # Edge Cases Handled
    ///
    /// * **File not found**: skipped
    /// * **File name conflict**: the file now occupying the original location
    ///   is backed up with a timestamp suffix first
    /// * **Permission denied**: recorded in `failed` with the reason
    pub fn replay(batch: &Batch, log: &ActivityLog, progress: &mut dyn ProgressSink) -> UndoResult {
        let total_operations = batch.operations.len();
        let mut report = UndoResult {
            total_operations,
            ..Default::default()
        };

        for (index, operation) in batch.operations.iter().enumerate() {
            let moved_path = operation.moved_path();
            if moved_path.symlink_metadata().is_err() {
                tracing::debug!(path = %moved_path.display(), "undo: file no longer present, skipping");
                report.skipped.push(moved_path);
            } else {
                match Self::restore_file(operation) {
                    Ok(()) => {
                        report.restored_count += 1;
                        log.info(&format!(
                            "Undo: Moved {} back to original location",
                            operation.filename
                        ));
                    }
                    Err(reason) => {
                        log.error(&format!(
                            "Error during undo for {}: {}",
                            operation.filename, reason
                        ));
                        report.failed.push((moved_path, reason));
                    }
                }
            }

            progress.update(index + 1, total_operations);
        }

        report
    }

    /// Restores a single file to its original location.
    fn restore_file(operation: &MoveOperation) -> Result<(), String> {
        let moved_path = operation.moved_path();
        let original_path = operation.original_path();

        if original_path.symlink_metadata().is_ok() {
            let backup_path = Self::generate_backup_path(&original_path);
            fs::rename(&original_path, &backup_path)
                .map_err(|e| format!("Could not backup conflicting file: {}", e))?;
        }

        fs::rename(&moved_path, &original_path)
            .map_err(|e| format!("Failed to restore file: {}", e))
    }

    /// Generates a backup path for a file by appending a timestamp.
    ///
    /// Example: `file.txt` becomes `file.txt.bak.20251109-143052`
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        original_path.with_file_name(format!("{}.bak.{}", filename, timestamp))
    }
}
