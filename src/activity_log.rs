//! Human-readable activity log.
//!
//! Every lifecycle event (moves, undo, scheduler runs) is appended to a text
//! file as a timestamped line and mirrored to `tracing`. The file can be read
//! back in full for display and truncated on request.

use crate::error::{OrganizeError, Result};
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only log file shared by the foreground and scheduler paths.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records a notable event.
    pub fn info(&self, message: &str) {
        tracing::info!("{}", message);
        self.append(message);
    }

    /// Records a failure. The line is tagged `ERROR:` in the file.
    pub fn error(&self, message: &str) {
        tracing::error!("{}", message);
        self.append(&format!("ERROR: {}", message));
    }

    /// Returns the whole log; an absent file reads as empty.
    pub fn read_all(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(OrganizeError::Log {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Truncates the log, then records that it was cleared.
    pub fn clear(&self) -> Result<()> {
        fs::write(&self.path, "").map_err(|e| OrganizeError::Log {
            path: self.path.clone(),
            source: e,
        })?;
        self.info("Log file cleared by user");
        Ok(())
    }

    // A broken log file must not fail the operation being logged.
    fn append(&self, message: &str) {
        let line = format!("{} - {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), "could not write activity log: {}", e);
        }
    }
}
