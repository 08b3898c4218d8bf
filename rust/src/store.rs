//! Task persistence boundary.
//!
//! [`TaskRepository`] and [`TaskChangeListener`] are the interfaces the
//! scheduler side consumes. [`InMemoryTaskStore`] is a reference
//! implementation that enforces the mutation-time rules: form validation on
//! insert/update and referential integrity on delete.

use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};
use thiserror::Error;

use crate::models::Task;

/// Rows per page when listing tasks.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A rejected field on a submitted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised by the persistence boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    NotFound(String),
    #[error("Task already exists: {0}")]
    DuplicateId(String),
    #[error("Task {task_id} cannot be deleted: {} other task(s) depend on it", .dependents.len())]
    Integrity {
        task_id: String,
        dependents: Vec<String>,
    },
    #[error("Invalid task: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),
}

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// Notification payload. Listeners should re-read the full task set rather
/// than apply the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChange {
    pub project_id: String,
    pub task_id: String,
    pub kind: ChangeKind,
}

/// Observer for task-set changes.
pub trait TaskChangeListener: Send + Sync {
    fn on_tasks_changed(&self, change: &TaskChange);
}

/// Read side of the persistence layer.
pub trait TaskRepository: Send + Sync {
    /// Every task of a project, ordered by start date.
    fn list_tasks(&self, project_id: &str) -> Result<Vec<Task>, StoreError>;

    /// Rows per page for [`TaskRepository::list_tasks_page`].
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// One page (1-based) of [`TaskRepository::list_tasks`].
    fn list_tasks_page(&self, project_id: &str, page: usize) -> Result<Vec<Task>, StoreError> {
        let tasks = self.list_tasks(project_id)?;
        Ok(paginate(tasks, page, self.page_size().max(1)))
    }
}

fn paginate(tasks: Vec<Task>, page: usize, page_size: usize) -> Vec<Task> {
    let skip = page.saturating_sub(1).saturating_mul(page_size);
    tasks.into_iter().skip(skip).take(page_size).collect()
}

/// In-memory task store with change notifications.
pub struct InMemoryTaskStore {
    /// Insertion ordered.
    tasks: RwLock<Vec<Task>>,
    listeners: RwLock<Vec<Weak<dyn TaskChangeListener>>>,
    page_size: usize,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
            page_size: page_size.max(1),
        }
    }

    /// Register a listener. The store holds it weakly; dropped listeners are
    /// pruned on the next notification.
    pub fn subscribe<L: TaskChangeListener + 'static>(&self, listener: &Arc<L>) {
        let weak: Weak<L> = Arc::downgrade(listener);
        self.listeners.write().push(weak);
    }

    pub fn get(&self, project_id: &str, task_id: &str) -> Option<Task> {
        self.tasks
            .read()
            .iter()
            .find(|t| t.project_id == project_id && t.id == task_id)
            .cloned()
    }

    pub fn insert(&self, task: Task) -> Result<(), StoreError> {
        let change = {
            let mut tasks = self.tasks.write();
            if tasks
                .iter()
                .any(|t| t.project_id == task.project_id && t.id == task.id)
            {
                return Err(StoreError::DuplicateId(task.id));
            }
            validate_task(&task, &tasks)?;

            let change = TaskChange {
                project_id: task.project_id.clone(),
                task_id: task.id.clone(),
                kind: ChangeKind::Inserted,
            };
            tasks.push(task);
            change
        };
        self.notify(&change);
        Ok(())
    }

    /// Replace an existing task, returning the previous version.
    pub fn update(&self, task: Task) -> Result<Task, StoreError> {
        let (previous, change) = {
            let mut tasks = self.tasks.write();
            let Some(pos) = tasks
                .iter()
                .position(|t| t.project_id == task.project_id && t.id == task.id)
            else {
                return Err(StoreError::NotFound(task.id));
            };
            validate_task(&task, &tasks)?;

            let change = TaskChange {
                project_id: task.project_id.clone(),
                task_id: task.id.clone(),
                kind: ChangeKind::Updated,
            };
            (std::mem::replace(&mut tasks[pos], task), change)
        };
        self.notify(&change);
        Ok(previous)
    }

    /// Remove a task nothing else depends on. The task set is left untouched
    /// on error.
    pub fn delete(&self, project_id: &str, task_id: &str) -> Result<Task, StoreError> {
        let (removed, change) = {
            let mut tasks = self.tasks.write();
            let Some(pos) = tasks
                .iter()
                .position(|t| t.project_id == project_id && t.id == task_id)
            else {
                return Err(StoreError::NotFound(task_id.to_string()));
            };

            let dependents: Vec<String> = tasks
                .iter()
                .filter(|t| t.project_id == project_id && t.depends_on(task_id))
                .map(|t| t.id.clone())
                .collect();
            if !dependents.is_empty() {
                tracing::warn!(
                    task_id,
                    dependents = dependents.len(),
                    "Refusing to delete task with dependents"
                );
                return Err(StoreError::Integrity {
                    task_id: task_id.to_string(),
                    dependents,
                });
            }

            let change = TaskChange {
                project_id: project_id.to_string(),
                task_id: task_id.to_string(),
                kind: ChangeKind::Deleted,
            };
            (tasks.remove(pos), change)
        };
        self.notify(&change);
        Ok(removed)
    }

    fn notify(&self, change: &TaskChange) {
        let listeners: Vec<Arc<dyn TaskChangeListener>> = {
            let mut registered = self.listeners.write();
            registered.retain(|weak| weak.strong_count() > 0);
            registered.iter().filter_map(Weak::upgrade).collect()
        };
        tracing::debug!(
            project_id = %change.project_id,
            task_id = %change.task_id,
            kind = ?change.kind,
            listeners = listeners.len(),
            "Task set changed"
        );
        for listener in listeners {
            listener.on_tasks_changed(change);
        }
    }
}

impl TaskRepository for InMemoryTaskStore {
    fn list_tasks(&self, project_id: &str) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        // Stable: undated tasks keep insertion order at the end
        tasks.sort_by_key(|t| (t.start_date.is_none(), t.start_date));
        Ok(tasks)
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Check a submitted task against the rest of its project.
///
/// `existing` may contain a previous version of `task`, which is ignored.
pub fn validate_task(task: &Task, existing: &[Task]) -> Result<(), StoreError> {
    let mut errors = Vec::new();

    if task.title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    }
    if task.start_date.is_none() {
        errors.push(FieldError::new("start_date", "Start date is required"));
    }
    if task.end_date.is_none() {
        errors.push(FieldError::new("end_date", "End date is required"));
    }
    if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
        if start > end {
            errors.push(FieldError::new(
                "end_date",
                "End date must not be before start date",
            ));
        }
    }

    if task.depends_on(&task.id) {
        errors.push(FieldError::new(
            "dependencies",
            "A task cannot depend on itself",
        ));
    }

    for dep_id in task.dependencies.iter().filter(|d| **d != task.id) {
        let dep = existing
            .iter()
            .find(|t| t.project_id == task.project_id && &t.id == dep_id);
        match dep {
            None => errors.push(FieldError::new(
                "dependencies",
                format!("Unknown dependency {}", dep_id),
            )),
            Some(dep) => {
                if let (Some(start), Some(dep_end)) = (task.start_date, dep.end_date) {
                    if start < dep_end {
                        errors.push(FieldError::new(
                            "dependencies",
                            format!("Task starts before dependency \"{}\" is finished", dep.title),
                        ));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Validation(errors))
    }
}
