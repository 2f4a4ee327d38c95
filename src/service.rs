//! The organizer service: the handle a front end drives.
//!
//! `OrganizerService` owns the category table, the persisted state, the
//! activity log and the scheduler. It is cheap to clone; all clones share the
//! same state. Organize and undo hold the state lock for the whole
//! read-modify-persist sequence, so a scheduled run and a manual run are
//! serialized rather than interleaved.

use crate::activity_log::ActivityLog;
use crate::config::{ConfigError, Settings};
use crate::error::{OrganizeError, Result};
use crate::file_category::FileMapper;
use crate::file_organizer::{Batch, FileOrganizer, OrganizeResult, PlannedMove, Trigger};
use crate::history::{AppState, StateStore};
use crate::progress::ProgressSink;
use crate::scheduler::{ScheduledJob, Scheduler, SchedulerState};
use crate::undo::{UndoManager, UndoResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

struct Inner {
    mapper: FileMapper,
    store: StateStore,
    log: ActivityLog,
    /// Files besides the state and log that organizing must leave alone.
    extra_protected: Vec<PathBuf>,
    state: Mutex<AppState>,
    scheduler: Mutex<Scheduler>,
}

/// Shared handle to the organizer.
#[derive(Clone)]
pub struct OrganizerService {
    inner: Arc<Inner>,
}

impl OrganizerService {
    /// Creates the service, loading any previously saved state.
    ///
    /// An unreadable or corrupt state file is reported in the log and the
    /// default state is used. A corrupt file is first renamed to
    /// `<name>.bak.<timestamp>` so its history is not lost on the next save.
    pub fn new(mapper: FileMapper, store: StateStore, log: ActivityLog) -> Self {
        Self::with_protected_files(mapper, store, log, Vec::new())
    }

    fn with_protected_files(
        mapper: FileMapper,
        store: StateStore,
        log: ActivityLog,
        extra_protected: Vec<PathBuf>,
    ) -> Self {
        let state = match store.load() {
            Ok(state) => state,
            Err(e) => {
                log.error(&format!("Error loading state: {}", e));
                if matches!(e, OrganizeError::InvalidState { .. }) {
                    match store.set_aside() {
                        Ok(backup) => log.info(&format!(
                            "Unreadable state file kept as {}",
                            backup.display()
                        )),
                        Err(e) => log.error(&format!("Could not keep unreadable state: {}", e)),
                    }
                }
                AppState::default()
            }
        };
        log.info("File Organizer started");

        let scheduler = Scheduler::new(state.schedule_minutes);
        Self {
            inner: Arc::new(Inner {
                mapper,
                store,
                log,
                extra_protected,
                state: Mutex::new(state),
                scheduler: Mutex::new(scheduler),
            }),
        }
    }

    /// Creates the service from loaded settings.
    ///
    /// The configuration file the settings came from, if any, is protected
    /// from organizing like the state and log files.
    pub fn from_settings(settings: &Settings) -> std::result::Result<Self, ConfigError> {
        let mapper = settings.file_mapper()?;
        let fresh = !settings.state_file.exists();
        let service = Self::with_protected_files(
            mapper,
            StateStore::new(&settings.state_file),
            ActivityLog::new(&settings.log_file),
            settings.loaded_from.iter().cloned().collect(),
        );
        if fresh {
            service.lock_state().schedule_minutes = settings.default_interval_minutes;
        }
        Ok(service)
    }

    /// Organizes `source_dir` once.
    pub fn organize(&self, source_dir: &Path) -> Result<OrganizeResult> {
        self.organize_with_progress(source_dir, &mut |_: usize, _: usize| {})
    }

    /// Organizes `source_dir`, reporting `(current, total)` after each file.
    ///
    /// When at least one file moved, the batch is appended to the history and
    /// the state is saved before the lock is released.
    pub fn organize_with_progress(
        &self,
        source_dir: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<OrganizeResult> {
        self.organize_pass(source_dir, Trigger::Manual, progress)
    }

    fn organize_pass(
        &self,
        source_dir: &Path,
        trigger: Trigger,
        progress: &mut dyn ProgressSink,
    ) -> Result<OrganizeResult> {
        let mut state = self.lock_state();
        let skip = self.protected_files();

        let (result, batch) = FileOrganizer::organize_directory(
            source_dir,
            trigger,
            &self.inner.mapper,
            &skip,
            &self.inner.log,
            progress,
        )?;

        if let Some(batch) = batch {
            state.move_history.push(batch);
            self.save_locked(&state)?;
        }

        tracing::debug!(
            source = %source_dir.display(),
            total = result.total_files,
            moved = result.moved_count,
            "organize pass finished"
        );
        Ok(result)
    }

    /// Lists where each file of `source_dir` would be moved.
    pub fn preview(&self, source_dir: &Path) -> Result<Vec<PlannedMove>> {
        FileOrganizer::preview(source_dir, &self.inner.mapper, &self.protected_files())
    }

    /// Undoes the most recent batch.
    pub fn undo_last(&self) -> Result<UndoResult> {
        self.undo_last_with_progress(&mut |_: usize, _: usize| {})
    }

    /// Undoes the most recent batch, reporting progress per operation.
    ///
    /// The batch leaves the in-memory history before replay, and the
    /// shortened history is persisted after replay however many files were
    /// restored. If the process dies mid-replay the batch is still on disk
    /// and a later undo finishes the job, skipping files already restored.
    ///
    /// # Errors
    ///
    /// `EmptyHistory` when there is nothing to undo; the state is untouched.
    pub fn undo_last_with_progress(&self, progress: &mut dyn ProgressSink) -> Result<UndoResult> {
        let mut state = self.lock_state();
        let batch = state.move_history.pop().ok_or(OrganizeError::EmptyHistory)?;

        let report = UndoManager::replay(&batch, &self.inner.log, progress);
        self.inner.log.info(&format!(
            "Undo complete: {} of {} files restored",
            report.restored_count, report.total_operations
        ));

        self.save_locked(&state)?;
        Ok(report)
    }

    /// Starts (or restarts) periodic organizing of `source_dir`.
    ///
    /// On success the interval and folder become the saved defaults.
    pub fn start_scheduler(&self, interval_minutes: i64, source_dir: &Path) -> Result<()> {
        let source_dir = absolute_dir(source_dir);
        let job = self.scheduled_job();
        self.lock_scheduler()
            .start(interval_minutes, &source_dir, job)?;
        self.after_scheduler_start(interval_minutes, &source_dir);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn start_scheduler_with_period(
        &self,
        interval_minutes: i64,
        period: std::time::Duration,
        source_dir: &Path,
    ) -> Result<()> {
        if interval_minutes <= 0 {
            return Err(OrganizeError::InvalidInterval(interval_minutes));
        }
        let source_dir = absolute_dir(source_dir);
        let job = self.scheduled_job();
        self.lock_scheduler()
            .start_with_period(interval_minutes, period, &source_dir, job)?;
        self.after_scheduler_start(interval_minutes, &source_dir);
        Ok(())
    }

    /// Stops the scheduler. A run already in progress finishes.
    pub fn stop_scheduler(&self) -> bool {
        let was_running = self.lock_scheduler().stop();
        if was_running {
            self.inner.log.info("Scheduler stopped.");
        }
        was_running
    }

    /// Whether the timer runs, and its interval (the saved one when idle).
    pub fn scheduler_state(&self) -> SchedulerState {
        let current = self.lock_scheduler().state();
        if current.running {
            current
        } else {
            SchedulerState {
                interval_minutes: self.schedule_minutes(),
                running: false,
            }
        }
    }

    /// Snapshot of the batch history, oldest first.
    pub fn history(&self) -> Vec<Batch> {
        self.lock_state().move_history.clone()
    }

    pub fn log_text(&self) -> Result<String> {
        self.inner.log.read_all()
    }

    pub fn clear_log(&self) -> Result<()> {
        self.inner.log.clear()
    }

    /// The last folder chosen, empty if none.
    pub fn source_path(&self) -> String {
        self.lock_state().source_path.clone()
    }

    /// Remembers `path`, made absolute, as the current folder and saves the
    /// state.
    pub fn set_source_path(&self, path: &Path) -> Result<()> {
        let mut state = self.lock_state();
        let path = absolute_dir(path).to_string_lossy().into_owned();
        if state.source_path == path {
            return Ok(());
        }
        state.source_path = path;
        self.save_locked(&state)
    }

    /// The saved scheduler interval in minutes.
    pub fn schedule_minutes(&self) -> i64 {
        self.lock_state().schedule_minutes
    }

    pub fn mapper(&self) -> &FileMapper {
        &self.inner.mapper
    }

    /// Stops the scheduler and saves the state.
    pub fn shutdown(&self) -> Result<()> {
        self.stop_scheduler();
        let state = self.lock_state();
        self.save_locked(&state)
    }

    fn scheduled_job(&self) -> ScheduledJob {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Arc::new(move |source: &Path| {
            if let Some(inner) = weak.upgrade() {
                OrganizerService { inner }.run_scheduled(source);
            }
        })
    }

    fn run_scheduled(&self, source_dir: &Path) {
        self.inner.log.info("Scheduled organization started");
        match self.organize_pass(source_dir, Trigger::Scheduled, &mut |_: usize, _: usize| {}) {
            Ok(result) if result.total_files == 0 => {
                self.inner.log.info("Scheduled organization: No files to organize");
            }
            Ok(result) => {
                self.inner.log.info(&format!(
                    "Scheduled organization complete: {} files moved",
                    result.moved_count
                ));
            }
            Err(e) => {
                self.inner
                    .log
                    .error(&format!("Error in scheduled organization: {}", e));
            }
        }
    }

    fn after_scheduler_start(&self, interval_minutes: i64, source_dir: &Path) {
        self.inner.log.info(&format!(
            "Scheduler started. Will run every {} minutes.",
            interval_minutes
        ));

        let mut state = self.lock_state();
        state.schedule_minutes = interval_minutes;
        state.source_path = source_dir.to_string_lossy().into_owned();
        if let Err(e) = self.save_locked(&state) {
            self.inner.log.error(&format!("Could not save state: {}", e));
        }
    }

    fn save_locked(&self, state: &MutexGuard<'_, AppState>) -> Result<()> {
        self.inner.store.save(state).inspect_err(|e| {
            self.inner.log.error(&format!("Could not save state: {}", e));
        })
    }

    /// The state, log and configuration files, which must never be organized
    /// away.
    fn protected_files(&self) -> Vec<PathBuf> {
        [self.inner.store.path(), self.inner.log.path()]
            .into_iter()
            .chain(self.inner.extra_protected.iter().map(PathBuf::as_path))
            .filter_map(|path| fs::canonicalize(path).ok())
            .collect()
    }

    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, Scheduler> {
        self.inner
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Absolute form of a folder path. Existing folders are canonicalized; others
/// are joined onto the working directory. An empty path stays empty.
fn absolute_dir(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
