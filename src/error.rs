//! Error types for organize, undo and scheduling operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for autosort operations.
pub type Result<T> = std::result::Result<T, OrganizeError>;

/// Errors that can occur while organizing, undoing or scheduling.
///
/// Whole-operation preconditions (`Directory`, `InvalidInterval`, `NoSource`,
/// `EmptyHistory`) are raised before anything is touched. `MoveFailure` and
/// `DirectoryCreationFailed` describe a single file and never abort a batch.
#[derive(Error, Debug)]
pub enum OrganizeError {
    /// The source folder is missing, not a directory, or unreadable.
    #[error("Cannot read directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A scheduler interval that is zero or negative.
    #[error("Invalid schedule interval: {0} minutes (must be greater than zero)")]
    InvalidInterval(i64),

    /// The scheduler was started without a source folder.
    #[error("No source folder selected")]
    NoSource,

    /// The timer thread could not be spawned.
    #[error("Failed to start the scheduler thread: {0}")]
    SchedulerSpawn(#[source] std::io::Error),

    /// Undo was requested with an empty history.
    #[error("Nothing to undo")]
    EmptyHistory,

    /// Failed to move a file into (or back out of) a category directory.
    #[error("Failed to move {} to {}: {cause}", from.display(), to.display())]
    MoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read the state file.
    #[error("Failed to read state file {}: {source}", path.display())]
    StateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the state file.
    #[error("Failed to write state file {}: {source}", path.display())]
    StateWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The state file exists but does not parse.
    #[error("Invalid state file {}: {reason}", path.display())]
    InvalidState { path: PathBuf, reason: String },

    /// Failed to read or truncate the activity log.
    #[error("Activity log error at {}: {source}", path.display())]
    Log {
        path: PathBuf,
        source: std::io::Error,
    },
}
