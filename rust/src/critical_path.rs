//! Slack and critical-path extraction from the two passes.

use crate::backward_pass::BackwardPassResult;
use crate::forward_pass::ForwardPassResult;
use crate::graph::TaskGraph;
use crate::interner::TaskIdx;

/// Per-task slack and criticality, indexed by arena slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalPathResult {
    pub slack: Vec<f64>,
    pub critical: Vec<bool>,
    /// One critical path in dependency order, spanning the whole project.
    pub chain: Vec<TaskIdx>,
}

/// Derive slack (`latest_start - earliest_start`) and the critical set.
///
/// A task is critical when its slack is within `epsilon` of zero.
pub fn extract_critical_path(
    graph: &TaskGraph<'_>,
    forward: &ForwardPassResult,
    backward: &BackwardPassResult,
    epsilon: f64,
) -> CriticalPathResult {
    let slack: Vec<f64> = backward
        .latest_start
        .iter()
        .zip(&forward.earliest_start)
        .map(|(ls, es)| ls - es)
        .collect();
    let critical: Vec<bool> = slack.iter().map(|s| s.abs() < epsilon).collect();
    let chain = follow_critical_chain(graph, forward, &critical, epsilon);

    CriticalPathResult {
        slack,
        critical,
        chain,
    }
}

/// Walk one critical path from offset zero to project end.
///
/// Every critical task finishing before the project end has a critical
/// dependent starting exactly when it finishes, so the walk always completes
/// on a correctly computed schedule. Ties go to the smallest task ID.
fn follow_critical_chain(
    graph: &TaskGraph<'_>,
    forward: &ForwardPassResult,
    critical: &[bool],
    epsilon: f64,
) -> Vec<TaskIdx> {
    let by_id = |idx: &TaskIdx| graph.task(*idx).id.as_str();

    let Some(mut current) = (0..graph.len())
        .filter(|&idx| critical[idx] && forward.earliest_start[idx].abs() < epsilon)
        .min_by_key(by_id)
    else {
        return Vec::new();
    };

    let mut chain = vec![current];
    while (forward.project_duration - forward.earliest_finish[current]).abs() >= epsilon {
        let finish = forward.earliest_finish[current];
        let next = graph
            .dependents(current)
            .iter()
            .copied()
            .filter(|&u| critical[u] && (forward.earliest_start[u] - finish).abs() < epsilon)
            .min_by_key(by_id);

        match next {
            Some(next) => {
                chain.push(next);
                current = next;
            }
            None => break,
        }
    }

    chain
}
