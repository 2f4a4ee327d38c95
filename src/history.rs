//! Persisted application state: last source folder, schedule interval and the
//! history of organize batches that undo replays.

use crate::error::{OrganizeError, Result};
use crate::file_organizer::Batch;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Interval used when the state file does not specify one.
pub const DEFAULT_SCHEDULE_MINUTES: i64 = 5;

fn default_schedule_minutes() -> i64 {
    DEFAULT_SCHEDULE_MINUTES
}

/// Everything that survives a restart.
///
/// `move_history` is chronological: batches are pushed after an organize run
/// and popped by undo. Whether the scheduler was running is deliberately not
/// part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub source_path: String,
    #[serde(default = "default_schedule_minutes")]
    pub schedule_minutes: i64,
    #[serde(default)]
    pub move_history: Vec<Batch>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            source_path: String::new(),
            schedule_minutes: DEFAULT_SCHEDULE_MINUTES,
            move_history: Vec::new(),
        }
    }
}

/// Reads and writes `AppState` as JSON.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state, or the default state if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// `StateRead` if the file cannot be read, `InvalidState` if it is not a
    /// valid state document.
    pub fn load(&self) -> Result<AppState> {
        let json_string = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppState::default()),
            Err(e) => {
                return Err(OrganizeError::StateRead {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        serde_json::from_str(&json_string).map_err(|e| OrganizeError::InvalidState {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Saves the state.
    ///
    /// The document is written next to the target and renamed over it, so a
    /// crash mid-write leaves the previous state intact.
    pub fn save(&self, state: &AppState) -> Result<()> {
        let json_string = serde_json::to_string_pretty(state).map_err(|e| {
            OrganizeError::StateWrite {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            }
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| OrganizeError::StateWrite {
                path: self.path.clone(),
                source: e,
            })?;
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json_string)
            .and_then(|()| fs::rename(&tmp_path, &self.path))
            .map_err(|e| OrganizeError::StateWrite {
                path: self.path.clone(),
                source: e,
            })
    }

    /// Renames an unreadable state file to `<name>.bak.<timestamp>` so the
    /// next save does not destroy it. Returns the new path.
    pub fn set_aside(&self) -> Result<PathBuf> {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".bak.{}", Local::now().format("%Y%m%d-%H%M%S")));
        let backup_path = self.path.with_file_name(name);

        fs::rename(&self.path, &backup_path).map_err(|e| OrganizeError::StateWrite {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(backup_path)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
