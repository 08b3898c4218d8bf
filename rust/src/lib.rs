//! Critical-path scheduling for project task sets.
//!
//! [`compute`] turns one project's tasks into a [`Schedule`] of earliest and
//! latest times, slack and the critical set. [`ScheduleService`] keeps a
//! schedule per project current as a [`TaskRepository`] changes, and
//! [`TimelineScale`] places the results on a Gantt chart.
//!
//! With the `python` feature the crate also builds as an extension module.

// Allow clippy warning triggered by PyO3 macro expansion
#![cfg_attr(feature = "python", allow(clippy::useless_conversion))]

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod backward_pass;
pub mod config;
pub mod critical_path;
pub mod duration;
pub mod forward_pass;
pub mod graph;
pub mod interner;
pub mod logging;
pub mod models;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod timeline;

pub use config::{InvalidEpsilon, PassStrategy, SchedulerConfig, UnknownStrategy};
pub use graph::{GraphError, TaskGraph};
pub use models::{
    parse_record_date, RecordId, Schedule, ScheduleWarning, Task, TaskRecord, TaskStatus,
    TaskTiming,
};
pub use scheduler::{compute, compute_with_config, CpmScheduler, ScheduleError};
pub use service::{ScheduleService, ServiceError};
pub use store::{
    validate_task, ChangeKind, FieldError, InMemoryTaskStore, StoreError, TaskChange,
    TaskChangeListener, TaskRepository,
};
pub use timeline::{BarPosition, TimelineScale};

/// Compute the critical-path schedule for one project's tasks.
///
/// # Raises
/// * ValueError on a circular dependency or a repeated task id
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(signature = (tasks, config=None))]
fn compute_schedule(tasks: Vec<Task>, config: Option<SchedulerConfig>) -> PyResult<Schedule> {
    let config = config.unwrap_or_default();
    compute_with_config(&tasks, &config)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn taskflow_cpm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Data model classes
    m.add_class::<Task>()?;
    m.add_class::<TaskTiming>()?;
    m.add_class::<Schedule>()?;

    // Configuration classes
    m.add_class::<SchedulerConfig>()?;

    // Functions
    m.add_function(wrap_pyfunction!(compute_schedule, m)?)?;

    Ok(())
}
