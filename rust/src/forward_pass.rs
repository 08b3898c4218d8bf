//! Forward pass: earliest start and finish per task.

use crate::config::PassStrategy;
use crate::graph::TaskGraph;
use crate::interner::TaskIdx;

/// Earliest times indexed by arena slot, in days from offset zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPassResult {
    pub earliest_start: Vec<f64>,
    pub earliest_finish: Vec<f64>,
    /// Maximum earliest finish; 0 for an empty task set.
    pub project_duration: f64,
    /// Full sweeps over the task list (1 for the topological strategy).
    pub sweeps: usize,
}

/// Compute earliest start/finish for every task.
///
/// `graph` must already have passed [`TaskGraph::check_acyclic`].
/// `durations` is indexed like the graph.
pub fn forward_pass(
    graph: &TaskGraph<'_>,
    durations: &[f64],
    strategy: PassStrategy,
) -> ForwardPassResult {
    let mut earliest_start = vec![0.0; graph.len()];
    let mut earliest_finish = durations.to_vec();

    let sweeps = match strategy {
        PassStrategy::Relaxation => {
            relax_forward(graph, durations, &mut earliest_start, &mut earliest_finish)
        }
        PassStrategy::Topological => {
            // An acyclic graph always has an order; fall back to relaxation otherwise
            match graph.topological_order() {
                Ok(order) => {
                    for idx in order {
                        let start = max_dependency_finish(graph, idx, &earliest_finish);
                        earliest_start[idx] = start;
                        earliest_finish[idx] = start + durations[idx];
                    }
                    1
                }
                Err(_) => relax_forward(graph, durations, &mut earliest_start, &mut earliest_finish),
            }
        }
    };

    let project_duration = earliest_finish.iter().copied().fold(0.0, f64::max);

    ForwardPassResult {
        earliest_start,
        earliest_finish,
        project_duration,
        sweeps,
    }
}

/// Sweep in task-list order until a full sweep changes nothing.
///
/// On an acyclic graph the fixed point is reached within `n` sweeps plus one
/// confirming sweep, which also bounds the loop.
fn relax_forward(
    graph: &TaskGraph<'_>,
    durations: &[f64],
    earliest_start: &mut [f64],
    earliest_finish: &mut [f64],
) -> usize {
    let max_sweeps = graph.len() + 1;
    let mut sweeps = 0;

    loop {
        sweeps += 1;
        let mut changed = false;

        for idx in 0..graph.len() {
            if graph.deps(idx).is_empty() {
                continue;
            }
            let m = max_dependency_finish(graph, idx, earliest_finish);
            if m > 0.0 && earliest_start[idx] != m {
                earliest_start[idx] = m;
                earliest_finish[idx] = m + durations[idx];
                changed = true;
            }
        }

        if !changed || sweeps >= max_sweeps {
            return sweeps;
        }
    }
}

fn max_dependency_finish(graph: &TaskGraph<'_>, idx: TaskIdx, earliest_finish: &[f64]) -> f64 {
    graph
        .deps(idx)
        .iter()
        .map(|&dep| earliest_finish[dep])
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    fn make_task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, "p1", id).with_dependencies(deps.iter().copied())
    }

    fn diamond() -> Vec<Task> {
        vec![
            make_task("a", &[]),
            make_task("b", &["a"]),
            make_task("c", &["a"]),
            make_task("d", &["b", "c"]),
        ]
    }

    #[test]
    fn test_diamond_earliest_times() {
        let tasks = diamond();
        let graph = TaskGraph::build(&tasks).unwrap();
        let result = forward_pass(&graph, &[2.0, 3.0, 2.0, 1.0], PassStrategy::Relaxation);

        assert_eq!(result.earliest_start, vec![0.0, 2.0, 2.0, 5.0]);
        assert_eq!(result.earliest_finish, vec![2.0, 5.0, 4.0, 6.0]);
        assert_eq!(result.project_duration, 6.0);
    }

    #[test]
    fn test_reverse_input_needs_more_sweeps() {
        // Dependents listed before their dependencies
        let tasks = vec![
            make_task("c", &["b"]),
            make_task("b", &["a"]),
            make_task("a", &[]),
        ];
        let graph = TaskGraph::build(&tasks).unwrap();
        let durations = [4.0, 3.0, 2.0];

        let relaxed = forward_pass(&graph, &durations, PassStrategy::Relaxation);
        assert_eq!(relaxed.earliest_start, vec![5.0, 2.0, 0.0]);
        assert_eq!(relaxed.project_duration, 9.0);
        assert!(relaxed.sweeps >= 3);

        let topo = forward_pass(&graph, &durations, PassStrategy::Topological);
        assert_eq!(topo.earliest_start, relaxed.earliest_start);
        assert_eq!(topo.earliest_finish, relaxed.earliest_finish);
        assert_eq!(topo.sweeps, 1);
    }

    #[test]
    fn test_independent_tasks_start_at_zero() {
        let tasks = vec![make_task("a", &[]), make_task("b", &["ghost"])];
        let graph = TaskGraph::build(&tasks).unwrap();
        let result = forward_pass(&graph, &[3.0, 5.0], PassStrategy::Relaxation);

        assert_eq!(result.earliest_start, vec![0.0, 0.0]);
        assert_eq!(result.project_duration, 5.0);
        assert_eq!(result.sweeps, 1);
    }

    #[test]
    fn test_empty_graph() {
        let tasks: Vec<Task> = Vec::new();
        let graph = TaskGraph::build(&tasks).unwrap();
        let result = forward_pass(&graph, &[], PassStrategy::Relaxation);
        assert_eq!(result.project_duration, 0.0);
        assert!(result.earliest_start.is_empty());
    }
}
