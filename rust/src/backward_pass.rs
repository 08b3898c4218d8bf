//! Backward pass: latest start and finish per task, seeded from project end.

use crate::config::PassStrategy;
use crate::graph::TaskGraph;
use crate::interner::TaskIdx;

/// Latest times indexed by arena slot, in days from offset zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BackwardPassResult {
    pub latest_start: Vec<f64>,
    pub latest_finish: Vec<f64>,
    pub sweeps: usize,
}

/// Compute latest start/finish for every task.
///
/// A task nothing depends on may finish as late as `project_duration`; any
/// other task must finish before its earliest-needed dependent starts.
/// `graph` must already have passed [`TaskGraph::check_acyclic`].
pub fn backward_pass(
    graph: &TaskGraph<'_>,
    durations: &[f64],
    project_duration: f64,
    strategy: PassStrategy,
) -> BackwardPassResult {
    let mut latest_finish = vec![project_duration; graph.len()];
    let mut latest_start: Vec<f64> = durations.iter().map(|d| project_duration - d).collect();

    let sweeps = match strategy {
        PassStrategy::Relaxation => relax_backward(
            graph,
            durations,
            project_duration,
            &mut latest_start,
            &mut latest_finish,
        ),
        PassStrategy::Topological => match graph.topological_order() {
            Ok(order) => {
                for &idx in order.iter().rev() {
                    let finish = min_dependent_start(graph, idx, &latest_start)
                        .unwrap_or(project_duration);
                    latest_finish[idx] = finish;
                    latest_start[idx] = finish - durations[idx];
                }
                1
            }
            Err(_) => relax_backward(
                graph,
                durations,
                project_duration,
                &mut latest_start,
                &mut latest_finish,
            ),
        },
    };

    BackwardPassResult {
        latest_start,
        latest_finish,
        sweeps,
    }
}

/// Sweep in reverse task-list order until a full sweep changes nothing.
fn relax_backward(
    graph: &TaskGraph<'_>,
    durations: &[f64],
    project_duration: f64,
    latest_start: &mut [f64],
    latest_finish: &mut [f64],
) -> usize {
    let max_sweeps = graph.len() + 1;
    let mut sweeps = 0;

    loop {
        sweeps += 1;
        let mut changed = false;

        for idx in (0..graph.len()).rev() {
            let Some(m) = min_dependent_start(graph, idx, latest_start) else {
                continue;
            };
            if m < project_duration && latest_finish[idx] != m {
                latest_finish[idx] = m;
                latest_start[idx] = m - durations[idx];
                changed = true;
            }
        }

        if !changed || sweeps >= max_sweeps {
            return sweeps;
        }
    }
}

/// Smallest latest start among the task's dependents, `None` if it has none.
fn min_dependent_start(graph: &TaskGraph<'_>, idx: TaskIdx, latest_start: &[f64]) -> Option<f64> {
    graph
        .dependents(idx)
        .iter()
        .map(|&dependent| latest_start[dependent])
        .reduce(f64::min)
}
