//! Chart scale for the Gantt view.
//!
//! Maps calendar dates and schedule offsets to horizontal percentages of a
//! timeline that pads the project by a few days on either side.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::duration::{MIN_DURATION_DAYS, SECONDS_PER_DAY};
use crate::models::{offset_to_datetime, Schedule, Task};

/// Days of padding before the first start and after the last end.
pub const MARGIN_DAYS: u64 = 5;

/// Span used when there is nothing dated to show.
pub const EMPTY_SPAN_DAYS: i64 = 30;

/// Most day columns drawn in the header.
pub const MAX_DAY_COLUMNS: usize = 30;

/// Horizontal placement of one bar, in percent of the timeline width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarPosition {
    pub start_percent: f64,
    pub width_percent: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineScale {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Whole days between `start` and `end`, rounded up. Never zero.
    pub total_days: i64,
}

fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / SECONDS_PER_DAY
}

impl TimelineScale {
    /// Scale over `[first, last]` padded by [`MARGIN_DAYS`] on each side.
    /// Padding stops at the ends of the representable calendar.
    pub fn spanning(first: NaiveDateTime, last: NaiveDateTime) -> Self {
        let margin = Days::new(MARGIN_DAYS);
        let start = first.checked_sub_days(margin).unwrap_or(NaiveDateTime::MIN);
        let end = last.checked_add_days(margin).unwrap_or(NaiveDateTime::MAX);
        let total_days = (days_between(start, end).ceil() as i64).max(1);
        Self {
            start,
            end,
            total_days,
        }
    }

    fn empty(today: NaiveDate) -> Self {
        let start = today.and_time(NaiveTime::MIN);
        Self {
            start,
            end: start,
            total_days: EMPTY_SPAN_DAYS,
        }
    }

    /// Scale covering the stored dates of `tasks`. Undated tasks are ignored;
    /// with nothing dated the scale starts at `today`.
    pub fn from_tasks(tasks: &[Task], today: NaiveDate) -> Self {
        let first = tasks.iter().filter_map(|t| t.start_date).min();
        let last = tasks.iter().filter_map(|t| t.end_date).max();
        match (first, last) {
            (Some(first), Some(last)) => Self::spanning(first, last.max(first)),
            _ => Self::empty(today),
        }
    }

    /// Scale covering a computed schedule from its anchor to its earliest end.
    pub fn from_schedule(schedule: &Schedule, today: NaiveDate) -> Self {
        match schedule.anchor {
            Some(anchor) => Self::spanning(
                anchor,
                schedule.project_end().unwrap_or(NaiveDateTime::MAX),
            ),
            None => Self::empty(today),
        }
    }

    /// Place an interval. Starts before the scale clamp to its left edge and
    /// every bar is at least one day wide.
    pub fn position(&self, from: NaiveDateTime, to: NaiveDateTime) -> BarPosition {
        let offset = days_between(self.start, from).max(0.0);
        let length = days_between(from, to).max(MIN_DURATION_DAYS);
        let total = self.total_days as f64;
        BarPosition {
            start_percent: offset / total * 100.0,
            width_percent: length / total * 100.0,
        }
    }

    /// Bar for a task's stored dates, or `None` if either is missing.
    pub fn bar(&self, task: &Task) -> Option<BarPosition> {
        Some(self.position(task.start_date?, task.end_date?))
    }

    /// Bar for a task's computed earliest window.
    pub fn scheduled_bar(&self, schedule: &Schedule, task_id: &str) -> Option<BarPosition> {
        let (from, to) = schedule.calendar_window(task_id)?;
        Some(self.position(from, to))
    }

    /// Bar for a task's latest window: where it can sit without delaying the project.
    pub fn latest_bar(&self, schedule: &Schedule, task_id: &str) -> Option<BarPosition> {
        let anchor = schedule.anchor?;
        let timing = schedule.timing(task_id)?;
        Some(self.position(
            offset_to_datetime(anchor, timing.latest_start)?,
            offset_to_datetime(anchor, timing.latest_finish)?,
        ))
    }

    /// Dates for the header columns, one per day from the scale start.
    pub fn day_labels(&self) -> Vec<NaiveDate> {
        let first = self.start.date();
        first
            .iter_days()
            .take(self.column_count())
            .collect()
    }

    pub fn column_count(&self) -> usize {
        (self.total_days as usize).min(MAX_DAY_COLUMNS)
    }

    pub fn column_width_percent(&self) -> f64 {
        100.0 / self.column_count() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::compute;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn make_task(id: &str, start: u32, end: u32, deps: &[&str]) -> Task {
        Task::new(id, "p1", id)
            .with_dates(day(4, start), day(4, end))
            .with_dependencies(deps.iter().copied())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_scale_pads_project() {
        let tasks = vec![make_task("a", 1, 3, &[]), make_task("b", 3, 6, &["a"])];
        let scale = TimelineScale::from_tasks(&tasks, day(1, 1));

        assert_eq!(scale.start.date(), day(3, 27));
        assert_eq!(scale.end.date(), day(4, 11));
        assert_eq!(scale.total_days, 15);
    }

    #[test]
    fn test_bar_positions() {
        let tasks = vec![make_task("a", 1, 3, &[]), make_task("b", 3, 6, &["a"])];
        let scale = TimelineScale::from_tasks(&tasks, day(1, 1));

        let a = scale.bar(&tasks[0]).unwrap();
        assert!(approx(a.start_percent, 5.0 / 15.0 * 100.0));
        assert!(approx(a.width_percent, 2.0 / 15.0 * 100.0));

        // zero-length tasks still get a one-day bar
        let milestone = make_task("m", 4, 4, &[]);
        let bar = scale.bar(&milestone).unwrap();
        assert!(approx(bar.width_percent, 1.0 / 15.0 * 100.0));

        assert!(scale.bar(&Task::new("u", "p1", "undated")).is_none());
    }

    #[test]
    fn test_start_before_scale_clamps_to_zero() {
        let tasks = vec![make_task("a", 10, 12, &[])];
        let scale = TimelineScale::from_tasks(&tasks, day(1, 1));
        let early = make_task("early", 1, 2, &[]);
        assert_eq!(scale.bar(&early).unwrap().start_percent, 0.0);
    }

    #[test]
    fn test_empty_scale_uses_today() {
        let scale = TimelineScale::from_tasks(&[], day(6, 15));
        assert_eq!(scale.start.date(), day(6, 15));
        assert_eq!(scale.total_days, 30);
        assert_eq!(scale.column_count(), 30);

        let schedule = compute(&[]).unwrap();
        assert_eq!(TimelineScale::from_schedule(&schedule, day(6, 15)), scale);
    }

    #[test]
    fn test_scheduled_bar_matches_stored_dates_when_consistent() {
        let tasks = vec![make_task("a", 1, 3, &[]), make_task("b", 3, 6, &["a"])];
        let schedule = compute(&tasks).unwrap();
        let scale = TimelineScale::from_schedule(&schedule, day(1, 1));

        assert_eq!(scale, TimelineScale::from_tasks(&tasks, day(1, 1)));
        assert_eq!(scale.scheduled_bar(&schedule, "b"), scale.bar(&tasks[1]));
        assert!(scale.scheduled_bar(&schedule, "missing").is_none());
    }

    #[test]
    fn test_latest_bar_shows_slack() {
        // c runs alongside b but is two days shorter
        let tasks = vec![
            make_task("a", 1, 3, &[]),
            make_task("b", 3, 7, &["a"]),
            make_task("c", 3, 5, &["a"]),
        ];
        let schedule = compute(&tasks).unwrap();
        let scale = TimelineScale::from_schedule(&schedule, day(1, 1));

        let early = scale.scheduled_bar(&schedule, "c").unwrap();
        let late = scale.latest_bar(&schedule, "c").unwrap();
        let shift = (late.start_percent - early.start_percent) / 100.0 * scale.total_days as f64;
        assert!(approx(shift, 2.0));
        assert!(approx(late.width_percent, early.width_percent));
    }

    #[test]
    fn test_day_labels_capped() {
        let short = TimelineScale::from_tasks(&[make_task("a", 1, 3, &[])], day(1, 1));
        let labels = short.day_labels();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], day(3, 27));
        assert_eq!(labels[11], day(4, 7));

        let long = TimelineScale::from_tasks(&[make_task("a", 1, 30, &[])], day(1, 1));
        assert_eq!(long.total_days, 39);
        assert_eq!(long.day_labels().len(), 30);
        assert!(approx(long.column_width_percent(), 100.0 / 30.0));
    }

    #[test]
    fn test_scale_near_calendar_limits() {
        let start = day(1, 1);
        let far = NaiveDate::from_ymd_opt(200_000, 1, 1).unwrap();
        let tasks = vec![
            Task::new("a", "p1", "a").with_dates(start, far),
            Task::new("b", "p1", "b")
                .with_dates(start, far)
                .with_dependencies(["a"]),
        ];
        let schedule = compute(&tasks).unwrap();

        let scale = TimelineScale::from_schedule(&schedule, day(1, 1));
        assert_eq!(scale.end, NaiveDateTime::MAX);
        assert!(scale.scheduled_bar(&schedule, "a").is_some());
        assert!(scale.scheduled_bar(&schedule, "b").is_none());
        assert!(scale.latest_bar(&schedule, "b").is_none());

        let last = Task::new("z", "p1", "z").with_dates(start, NaiveDate::MAX);
        let scale = TimelineScale::from_tasks(&[last], day(1, 1));
        assert_eq!(scale.end, NaiveDateTime::MAX);
    }
}
