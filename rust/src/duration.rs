//! Task durations in whole days, derived from start/end dates.

use crate::models::{ScheduleWarning, Task};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Shortest duration any task occupies, in days.
pub const MIN_DURATION_DAYS: f64 = 1.0;

/// Duration of a task: `max(1, ceil(end - start))` in days.
///
/// Returns the clamp warning alongside when the dates are missing or inverted.
/// A zero-length interval is clamped silently.
pub fn task_duration(task: &Task) -> (f64, Option<ScheduleWarning>) {
    let (start, end) = match (task.start_date, task.end_date) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return (
                MIN_DURATION_DAYS,
                Some(ScheduleWarning::MissingDates {
                    task_id: task.id.clone(),
                }),
            )
        }
    };

    if end < start {
        return (
            MIN_DURATION_DAYS,
            Some(ScheduleWarning::InvertedDates {
                task_id: task.id.clone(),
            }),
        );
    }

    let days = ((end - start).num_seconds() as f64 / SECONDS_PER_DAY).ceil();
    (days.max(MIN_DURATION_DAYS), None)
}

/// Durations for every task in input order, plus any clamp warnings.
pub fn compute_durations(tasks: &[Task]) -> (Vec<f64>, Vec<ScheduleWarning>) {
    let mut durations = Vec::with_capacity(tasks.len());
    let mut warnings = Vec::new();
    for task in tasks {
        let (duration, warning) = task_duration(task);
        durations.push(duration);
        warnings.extend(warning);
    }
    (durations, warnings)
}
