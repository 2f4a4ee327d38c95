//! autosort - keep a folder tidy by file type
//!
//! This library classifies files by extension, moves them into category
//! subdirectories, re-runs that on a timer, and undoes the most recent batch of
//! moves from a persisted history.

pub mod activity_log;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod history;
pub mod output;
pub mod progress;
pub mod scheduler;
pub mod service;
pub mod undo;

pub use activity_log::ActivityLog;
pub use config::{ConfigError, Settings};
pub use error::{OrganizeError, Result};
pub use file_category::{Category, FileMapper};
pub use file_organizer::{Batch, FileOrganizer, MoveOperation, OrganizeResult, PlannedMove, Trigger};
pub use history::{AppState, StateStore};
pub use progress::ProgressSink;
pub use scheduler::{Scheduler, SchedulerState};
pub use service::OrganizerService;
pub use undo::{UndoManager, UndoResult};

pub use cli::{OrganizeCommand, run_cli};
