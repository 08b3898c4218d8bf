//! Core data types for the project scheduler.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A unit of schedulable work within one project.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_date: Option<NaiveDateTime>,
    /// Predecessor task IDs. Order carries no meaning.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Completion percentage, 0-100. Display only.
    #[serde(default)]
    pub progress: u8,
    /// ÄTA (change and addition work) marker.
    #[serde(default, alias = "is_ata")]
    pub is_special: bool,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            title: title.into(),
            description: None,
            assignee: None,
            start_date: None,
            end_date: None,
            dependencies: Vec::new(),
            progress: 0,
            is_special: false,
        }
    }

    /// Set calendar dates, both at midnight.
    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start.and_time(NaiveTime::MIN));
        self.end_date = Some(end.and_time(NaiveTime::MIN));
        self
    }

    pub fn with_datetimes(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self
    }

    /// Whether this task lists `task_id` among its predecessors.
    pub fn depends_on(&self, task_id: &str) -> bool {
        self.dependencies.iter().any(|d| d == task_id)
    }

    /// Status shown in the task table, relative to `today`.
    pub fn status(&self, today: NaiveDate) -> TaskStatus {
        if self.progress >= 100 {
            return TaskStatus::Completed;
        }
        match self.end_date {
            Some(end) if end.date() < today => TaskStatus::Delayed,
            _ if self.progress > 0 => TaskStatus::InProgress,
            _ => TaskStatus::NotStarted,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (
        id,
        project_id,
        title,
        start_date=None,
        end_date=None,
        dependencies=None,
        progress=0,
        is_special=false,
        description=None,
        assignee=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn py_new(
        id: String,
        project_id: String,
        title: String,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
        dependencies: Option<Vec<String>>,
        progress: u8,
        is_special: bool,
        description: Option<String>,
        assignee: Option<String>,
    ) -> Self {
        Self {
            id,
            project_id,
            title,
            description,
            assignee,
            start_date,
            end_date,
            dependencies: dependencies.unwrap_or_default(),
            progress: progress.min(100),
            is_special,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, title={:?}, deps={}, is_special={})",
            self.id,
            self.title,
            self.dependencies.len(),
            self.is_special
        )
    }
}

/// Display status of a task in the task table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Delayed,
    Completed,
}

/// Task identifier as stored by the persistence layer.
///
/// Older rows use free-text ids, newer ones numeric ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

/// A task row as delivered by the persistence layer, before normalisation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: RecordId,
    pub project_id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub dependencies: Option<Vec<RecordId>>,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default, alias = "is_special")]
    pub is_ata: Option<bool>,
}

impl TaskRecord {
    /// Normalise into a [`Task`]. Unparseable dates become `None`.
    pub fn into_task(self) -> Task {
        Task {
            id: self.id.to_string(),
            project_id: self.project_id.to_string(),
            title: self.title,
            description: self.description,
            assignee: self.assignee,
            start_date: self.start_date.as_deref().and_then(parse_record_date),
            end_date: self.end_date.as_deref().and_then(parse_record_date),
            dependencies: self
                .dependencies
                .unwrap_or_default()
                .iter()
                .map(ToString::to_string)
                .collect(),
            progress: self.progress.unwrap_or(0).clamp(0, 100) as u8,
            is_special: self.is_ata.unwrap_or(false),
        }
    }
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        record.into_task()
    }
}

/// Parse a stored date: RFC 3339 timestamp, naive timestamp or plain `YYYY-MM-DD`.
pub fn parse_record_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Per-task timing from one scheduler run. All values are days from the anchor.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskTiming {
    pub duration: f64,
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    /// latest_start - earliest_start
    pub slack: f64,
    pub critical: bool,
    pub is_special: bool,
}

/// A problem the scheduler recovered from without aborting.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    /// Start or end date absent; duration clamped to one day.
    MissingDates { task_id: String },
    /// End date not after start date; duration clamped to one day.
    InvertedDates { task_id: String },
    /// Dependency on an ID that is not in the task set; ignored.
    DanglingDependency {
        task_id: String,
        dependency_id: String,
    },
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleWarning::MissingDates { task_id } => {
                write!(f, "Task {} is missing a start or end date", task_id)
            }
            ScheduleWarning::InvertedDates { task_id } => {
                write!(f, "Task {} ends before it starts", task_id)
            }
            ScheduleWarning::DanglingDependency {
                task_id,
                dependency_id,
            } => write!(
                f,
                "Task {} depends on unknown task {}",
                task_id, dependency_id
            ),
        }
    }
}

/// Result of one scheduler run. Never persisted.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub timings: BTreeMap<String, TaskTiming>,
    /// Maximum earliest finish across all tasks.
    pub project_duration: f64,
    pub critical_task_ids: BTreeSet<String>,
    /// One critical path in dependency order.
    pub critical_chain: Vec<String>,
    pub special_task_ids: BTreeSet<String>,
    /// Calendar time of offset zero: the earliest start date in the task set.
    pub anchor: Option<NaiveDateTime>,
    pub warnings: Vec<ScheduleWarning>,
}

impl Schedule {
    pub fn timing(&self, task_id: &str) -> Option<&TaskTiming> {
        self.timings.get(task_id)
    }

    pub fn is_critical(&self, task_id: &str) -> bool {
        self.critical_task_ids.contains(task_id)
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    /// Earliest start/finish of a task mapped onto the calendar via the anchor.
    ///
    /// `None` if the task is unknown, nothing is dated, or the window falls
    /// outside the representable calendar.
    pub fn calendar_window(&self, task_id: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let anchor = self.anchor?;
        let timing = self.timings.get(task_id)?;
        Some((
            offset_to_datetime(anchor, timing.earliest_start)?,
            offset_to_datetime(anchor, timing.earliest_finish)?,
        ))
    }

    /// Calendar time at which the whole project can finish at the earliest.
    pub fn project_end(&self) -> Option<NaiveDateTime> {
        offset_to_datetime(self.anchor?, self.project_duration)
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Schedule {
    #[getter(timings)]
    fn py_timings(&self) -> BTreeMap<String, TaskTiming> {
        self.timings.clone()
    }

    #[getter(project_duration)]
    fn py_project_duration(&self) -> f64 {
        self.project_duration
    }

    #[getter(critical_task_ids)]
    fn py_critical_task_ids(&self) -> BTreeSet<String> {
        self.critical_task_ids.clone()
    }

    #[getter(critical_chain)]
    fn py_critical_chain(&self) -> Vec<String> {
        self.critical_chain.clone()
    }

    #[getter(special_task_ids)]
    fn py_special_task_ids(&self) -> BTreeSet<String> {
        self.special_task_ids.clone()
    }

    #[getter(anchor)]
    fn py_anchor(&self) -> Option<NaiveDateTime> {
        self.anchor
    }

    #[getter(warnings)]
    fn py_warnings(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "Schedule(tasks={}, project_duration={}, critical={})",
            self.timings.len(),
            self.project_duration,
            self.critical_task_ids.len()
        )
    }
}

/// `anchor` plus `days`, or `None` past the calendar's range.
pub(crate) fn offset_to_datetime(anchor: NaiveDateTime, days: f64) -> Option<NaiveDateTime> {
    let seconds = (days * crate::duration::SECONDS_PER_DAY).round();
    if !seconds.is_finite() {
        return None;
    }
    // `as` saturates; out-of-range values are caught by try_seconds
    let delta = TimeDelta::try_seconds(seconds as i64)?;
    anchor.checked_add_signed(delta)
}
