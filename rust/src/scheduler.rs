//! Critical path scheduler facade.
//!
//! Runs graph building, durations, both passes and slack extraction in order
//! and assembles a [`Schedule`]. Each call is self-contained: all working
//! state lives in per-call arrays indexed by arena slot.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::backward_pass::backward_pass;
use crate::config::{InvalidEpsilon, SchedulerConfig};
use crate::critical_path::extract_critical_path;
use crate::duration::compute_durations;
use crate::forward_pass::forward_pass;
use crate::graph::{GraphError, TaskGraph};
use crate::models::{Schedule, Task, TaskTiming};
use crate::{log_changes, log_checks, log_debug};

/// Errors that abort a scheduler run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },
    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),
    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfig(String),
}

impl From<InvalidEpsilon> for ScheduleError {
    fn from(err: InvalidEpsilon) -> Self {
        ScheduleError::InvalidConfig(err.to_string())
    }
}

impl From<GraphError> for ScheduleError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::CircularDependency { cycle } => ScheduleError::CircularDependency { cycle },
            GraphError::DuplicateTaskId(id) => ScheduleError::DuplicateTaskId(id),
        }
    }
}

/// Compute the schedule for one project's tasks with the default configuration.
pub fn compute(tasks: &[Task]) -> Result<Schedule, ScheduleError> {
    compute_with_config(tasks, &SchedulerConfig::default())
}

/// Compute the schedule for one project's tasks.
///
/// Dangling dependencies and bad dates are recovered from and reported in
/// [`Schedule::warnings`]. Circular dependencies, duplicate IDs and an
/// unusable configuration are fatal and are detected before any pass runs. The result does not depend on the
/// order of `tasks`.
pub fn compute_with_config(
    tasks: &[Task],
    config: &SchedulerConfig,
) -> Result<Schedule, ScheduleError> {
    config.validate()?;
    let verbosity = config.verbosity;

    let graph = TaskGraph::build(tasks)?;
    if let Err(err) = graph.check_acyclic() {
        tracing::warn!(error = %err, "Rejecting task set");
        return Err(err.into());
    }

    let (durations, mut warnings) = compute_durations(tasks);
    warnings.extend_from_slice(graph.dangling());
    warnings.sort();
    warnings.dedup();
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    let forward = forward_pass(&graph, &durations, config.strategy);
    log_checks!(
        verbosity,
        "Forward pass: {} sweep(s), project duration {} days",
        forward.sweeps,
        forward.project_duration
    );

    let backward = backward_pass(
        &graph,
        &durations,
        forward.project_duration,
        config.strategy,
    );
    log_checks!(verbosity, "Backward pass: {} sweep(s)", backward.sweeps);

    let cp = extract_critical_path(&graph, &forward, &backward, config.critical_epsilon);

    let mut timings = BTreeMap::new();
    let mut critical_task_ids = BTreeSet::new();
    let mut special_task_ids = BTreeSet::new();

    for (idx, task) in tasks.iter().enumerate() {
        let timing = TaskTiming {
            duration: durations[idx],
            earliest_start: forward.earliest_start[idx],
            earliest_finish: forward.earliest_finish[idx],
            latest_start: backward.latest_start[idx],
            latest_finish: backward.latest_finish[idx],
            slack: cp.slack[idx],
            critical: cp.critical[idx],
            is_special: task.is_special,
        };
        log_debug!(
            verbosity,
            "  {}: ES={} EF={} LS={} LF={} slack={}",
            task.id,
            timing.earliest_start,
            timing.earliest_finish,
            timing.latest_start,
            timing.latest_finish,
            timing.slack
        );

        if timing.critical {
            critical_task_ids.insert(task.id.clone());
        }
        if task.is_special {
            special_task_ids.insert(task.id.clone());
        }
        timings.insert(task.id.clone(), timing);
    }

    let critical_chain = cp
        .chain
        .iter()
        .map(|&idx| graph.task(idx).id.clone())
        .collect();

    let anchor = tasks.iter().filter_map(|t| t.start_date).min();

    log_changes!(
        verbosity,
        "Scheduled {} task(s): duration {} days, {} critical, {} warning(s)",
        tasks.len(),
        forward.project_duration,
        critical_task_ids.len(),
        warnings.len()
    );

    Ok(Schedule {
        timings,
        project_duration: forward.project_duration,
        critical_task_ids,
        critical_chain,
        special_task_ids,
        anchor,
        warnings,
    })
}

/// Reusable scheduler bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct CpmScheduler {
    config: SchedulerConfig,
}

impl CpmScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn compute(&self, tasks: &[Task]) -> Result<Schedule, ScheduleError> {
        compute_with_config(tasks, &self.config)
    }
}
