//! Fixed-interval background re-runs of the organizer.
//!
//! A single timer thread sleeps for the interval, fires the job, and repeats.
//! The sleep doubles as the stop signal wait, so `stop` takes effect at the
//! next wakeup without interrupting a run that is already in progress.

use crate::error::{OrganizeError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// Work executed on every tick, given the folder being watched.
pub type ScheduledJob = Arc<dyn Fn(&Path) + Send + Sync>;

/// Snapshot of the scheduler for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerState {
    pub interval_minutes: i64,
    pub running: bool,
}

struct ActiveTimer {
    interval_minutes: i64,
    stop_tx: Sender<()>,
}

/// Owns at most one timer thread.
///
/// Dropping the scheduler stops the timer.
pub struct Scheduler {
    active: Option<ActiveTimer>,
    last_interval_minutes: i64,
}

impl Scheduler {
    pub fn new(interval_minutes: i64) -> Self {
        Self {
            active: None,
            last_interval_minutes: interval_minutes,
        }
    }

    /// Starts firing `job(source_dir)` every `interval_minutes` minutes.
    ///
    /// A timer that is already running is replaced by the new one.
    ///
    /// # Errors
    ///
    /// `InvalidInterval` for a non-positive interval and `NoSource` for an
    /// empty path. Neither leaves any trace on the current state.
    pub fn start(&mut self, interval_minutes: i64, source_dir: &Path, job: ScheduledJob) -> Result<()> {
        if interval_minutes <= 0 {
            return Err(OrganizeError::InvalidInterval(interval_minutes));
        }
        let seconds = u64::try_from(interval_minutes)
            .ok()
            .and_then(|minutes| minutes.checked_mul(60))
            .ok_or(OrganizeError::InvalidInterval(interval_minutes))?;
        self.start_with_period(interval_minutes, Duration::from_secs(seconds), source_dir, job)
    }

    /// Same as `start`, with the tick period given directly.
    ///
    /// `interval_minutes` is only recorded for `state()`.
    pub(crate) fn start_with_period(
        &mut self,
        interval_minutes: i64,
        period: Duration,
        source_dir: &Path,
        job: ScheduledJob,
    ) -> Result<()> {
        if source_dir.as_os_str().is_empty() {
            return Err(OrganizeError::NoSource);
        }

        self.stop();

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let source: PathBuf = source_dir.to_path_buf();
        thread::Builder::new()
            .name("autosort-scheduler".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => job(source.as_path()),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("scheduler thread exiting");
            })
            .map_err(OrganizeError::SchedulerSpawn)?;

        self.active = Some(ActiveTimer {
            interval_minutes,
            stop_tx,
        });
        self.last_interval_minutes = interval_minutes;
        Ok(())
    }

    /// Stops the timer. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(timer) => {
                // The thread may already be gone; either way it will not fire again.
                let _ = timer.stop_tx.send(());
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            interval_minutes: self
                .active
                .as_ref()
                .map(|timer| timer.interval_minutes)
                .unwrap_or(self.last_interval_minutes),
            running: self.is_running(),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
