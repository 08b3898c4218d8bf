//! Property tests for the scheduler over generated acyclic task sets.
//!
//! Dependencies only point at tasks generated earlier, so every set is a DAG;
//! the list is then shuffled so input order carries no information. Some
//! tasks are undated and some reference a task outside the set, so the
//! warning path is exercised too.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use taskflow_cpm::{
    compute, compute_with_config, PassStrategy, Schedule, ScheduleWarning, SchedulerConfig, Task,
};

const EPS: f64 = 1e-9;

fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 1)
        .unwrap()
        .checked_add_days(Days::new(offset))
        .unwrap()
}

const MISSING_ID: &str = "removed";

/// Generated shape of one task.
#[derive(Clone, Debug)]
struct TaskSpec {
    start: u64,
    length: u64,
    deps: Vec<bool>,
    dated: bool,
    dangling: bool,
}

fn task_id(i: usize) -> String {
    format!("t{:02}", i)
}

fn build_tasks(specs: Vec<TaskSpec>) -> Vec<Task> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| {
            let mut deps: Vec<String> = spec
                .deps
                .iter()
                .enumerate()
                .filter(|(_, picked)| **picked)
                .map(|(j, _)| task_id(j))
                .collect();
            if spec.dangling {
                deps.push(MISSING_ID.to_string());
            }
            let task = Task::new(task_id(i), "p1", format!("Task {}", i)).with_dependencies(deps);
            if spec.dated {
                task.with_dates(day(spec.start), day(spec.start + spec.length))
            } else {
                task
            }
        })
        .collect()
}

fn task_spec(i: usize) -> impl Strategy<Value = TaskSpec> {
    (
        0u64..10,
        0u64..6,
        prop::collection::vec(any::<bool>(), i),
        prop::bool::weighted(0.85),
        prop::bool::weighted(0.15),
    )
        .prop_map(|(start, length, deps, dated, dangling)| TaskSpec {
            start,
            length,
            deps,
            dated,
            dangling,
        })
}

fn task_set() -> impl Strategy<Value = Vec<Task>> {
    (1usize..12)
        .prop_flat_map(|n| {
            (0..n).map(task_spec).collect::<Vec<_>>()
        })
        .prop_map(build_tasks)
}

fn shuffled_task_set() -> impl Strategy<Value = (Vec<Task>, Vec<Task>)> {
    task_set().prop_flat_map(|tasks| {
        let shuffled = Just(tasks.clone()).prop_shuffle();
        (Just(tasks), shuffled)
    })
}

fn check_invariants(tasks: &[Task], schedule: &Schedule) -> Result<(), TestCaseError> {
    prop_assert_eq!(schedule.len(), tasks.len());

    let max_finish = schedule
        .timings
        .values()
        .map(|t| t.earliest_finish)
        .fold(0.0, f64::max);
    prop_assert!((schedule.project_duration - max_finish).abs() < EPS);

    for task in tasks {
        let timing = schedule.timing(&task.id).unwrap();
        let expected_start = task
            .dependencies
            .iter()
            .filter_map(|dep| schedule.timing(dep))
            .map(|dep| dep.earliest_finish)
            .fold(0.0, f64::max);

        prop_assert!((timing.earliest_start - expected_start).abs() < EPS, "ES of {}", task.id);
        prop_assert!((timing.earliest_finish - timing.earliest_start - timing.duration).abs() < EPS);
        prop_assert!(timing.duration >= 1.0);
        prop_assert!((timing.latest_start - (timing.latest_finish - timing.duration)).abs() < EPS);
        prop_assert!(timing.latest_finish <= schedule.project_duration + EPS);
        prop_assert!(timing.slack >= -EPS, "negative slack on {}", task.id);
        prop_assert_eq!(timing.critical, schedule.is_critical(&task.id));
    }

    let dangling = schedule
        .warnings
        .iter()
        .filter(|w| matches!(w, ScheduleWarning::DanglingDependency { .. }))
        .count();
    let expected_dangling = tasks.iter().filter(|t| t.depends_on(MISSING_ID)).count();
    prop_assert_eq!(dangling, expected_dangling);

    let undated = schedule
        .warnings
        .iter()
        .filter(|w| matches!(w, ScheduleWarning::MissingDates { .. }))
        .count();
    let expected_undated = tasks.iter().filter(|t| t.start_date.is_none()).count();
    prop_assert_eq!(undated, expected_undated);
    Ok(())
}

proptest! {
    #[test]
    fn schedule_invariants_hold(tasks in task_set()) {
        let schedule = compute(&tasks).unwrap();
        check_invariants(&tasks, &schedule)?;
    }

    #[test]
    fn input_order_does_not_matter((tasks, shuffled) in shuffled_task_set()) {
        let original = compute(&tasks).unwrap();
        let reordered = compute(&shuffled).unwrap();
        prop_assert_eq!(original, reordered);
    }

    #[test]
    fn strategies_agree(tasks in task_set()) {
        let relaxed = compute(&tasks).unwrap();
        let topo = compute_with_config(
            &tasks,
            &SchedulerConfig::default().with_strategy(PassStrategy::Topological),
        )
        .unwrap();
        prop_assert_eq!(relaxed, topo);
    }

    #[test]
    fn critical_chain_spans_project(tasks in task_set()) {
        let schedule = compute(&tasks).unwrap();
        let chain = &schedule.critical_chain;
        prop_assert!(!chain.is_empty());

        let first = schedule.timing(&chain[0]).unwrap();
        prop_assert!(first.earliest_start.abs() < EPS);
        let last = schedule.timing(&chain[chain.len() - 1]).unwrap();
        prop_assert!((last.earliest_finish - schedule.project_duration).abs() < EPS);

        for pair in chain.windows(2) {
            let before = schedule.timing(&pair[0]).unwrap();
            let after = schedule.timing(&pair[1]).unwrap();
            prop_assert!(schedule.is_critical(&pair[1]));
            prop_assert!((after.earliest_start - before.earliest_finish).abs() < EPS);
        }
    }

    #[test]
    fn recompute_is_idempotent(tasks in task_set()) {
        prop_assert_eq!(compute(&tasks).unwrap(), compute(&tasks).unwrap());
    }
}
