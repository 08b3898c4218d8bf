//! Per-project recompute coordination.
//!
//! Change notifications for a project bump a request generation. A refresh
//! takes the project's lock, skips the work if a snapshot at least that new
//! was already scheduled, and otherwise re-reads the full task set and
//! replaces the stored schedule. Refreshes of one project never overlap;
//! different projects proceed independently.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::config::SchedulerConfig;
use crate::log_changes;
use crate::models::Schedule;
use crate::scheduler::{CpmScheduler, ScheduleError};
use crate::store::{StoreError, TaskChange, TaskChangeListener, TaskRepository};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Failed to load tasks: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

pub type ScheduleResult = Result<Arc<Schedule>, ServiceError>;

#[derive(Default)]
struct ProjectSlot {
    /// Bumped on every change notification.
    requested: AtomicU64,
    state: Mutex<SlotState>,
}

#[derive(Default)]
struct SlotState {
    /// Request generation the stored result reflects.
    computed: u64,
    latest: Option<ScheduleResult>,
    runs: u64,
}

/// Keeps the latest schedule per project in step with the task store.
pub struct ScheduleService<R: TaskRepository> {
    repository: Arc<R>,
    scheduler: CpmScheduler,
    projects: RwLock<FxHashMap<String, Arc<ProjectSlot>>>,
}

impl<R: TaskRepository> ScheduleService<R> {
    pub fn new(repository: Arc<R>, config: SchedulerConfig) -> Self {
        Self {
            repository,
            scheduler: CpmScheduler::new(config),
            projects: RwLock::new(FxHashMap::default()),
        }
    }

    fn slot(&self, project_id: &str) -> Arc<ProjectSlot> {
        if let Some(slot) = self.projects.read().get(project_id) {
            return Arc::clone(slot);
        }
        Arc::clone(
            self.projects
                .write()
                .entry(project_id.to_string())
                .or_default(),
        )
    }

    /// Mark the project's schedule stale. Returns the new request generation.
    pub fn invalidate(&self, project_id: &str) -> u64 {
        self.slot(project_id).requested.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Bring the project's schedule up to date and return it.
    ///
    /// Any number of invalidations since the last refresh collapse into a
    /// single recompute over the newest task set.
    pub fn refresh(&self, project_id: &str) -> ScheduleResult {
        let slot = self.slot(project_id);
        let mut state = slot.state.lock();

        // Read under the lock: everything requested so far is covered by the
        // snapshot taken below.
        let target = slot.requested.load(Ordering::Acquire);
        if let Some(latest) = &state.latest {
            if state.computed >= target {
                return latest.clone();
            }
        }

        let result = self
            .repository
            .list_tasks(project_id)
            .map_err(ServiceError::from)
            .and_then(|tasks| self.scheduler.compute(&tasks).map_err(ServiceError::from))
            .map(Arc::new);

        state.computed = target;
        state.runs += 1;
        state.latest = Some(result.clone());

        match &result {
            Ok(schedule) => log_changes!(
                self.scheduler.config().verbosity,
                project_id,
                generation = target,
                "Recomputed schedule: {} task(s), duration {} days",
                schedule.len(),
                schedule.project_duration
            ),
            Err(err) => tracing::warn!(project_id, error = %err, "Schedule recompute failed"),
        }

        result
    }

    /// Last computed result without refreshing.
    pub fn latest(&self, project_id: &str) -> Option<ScheduleResult> {
        let slot = self.projects.read().get(project_id).cloned()?;
        let state = slot.state.lock();
        state.latest.clone()
    }

    /// Number of recomputes performed for a project.
    pub fn recompute_count(&self, project_id: &str) -> u64 {
        self.projects
            .read()
            .get(project_id)
            .map(|slot| slot.state.lock().runs)
            .unwrap_or(0)
    }

    /// Forget a project's cached schedule.
    pub fn evict(&self, project_id: &str) {
        self.projects.write().remove(project_id);
    }
}

impl<R: TaskRepository + 'static> TaskChangeListener for ScheduleService<R> {
    fn on_tasks_changed(&self, change: &TaskChange) {
        self.invalidate(&change.project_id);
        // Failures are kept in the slot for the caller to read
        let _ = self.refresh(&change.project_id);
    }
}
