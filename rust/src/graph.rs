//! Dependency graph over one project's task list.
//!
//! Builds the per-run arena: a dense index in input order, resolved
//! predecessor lists, reverse (dependent) lists and the dangling references
//! that were dropped. Also owns cycle detection, which must pass before any
//! relaxation runs.

use std::collections::VecDeque;
use thiserror::Error;

use crate::interner::{TaskIdx, TaskIndex};
use crate::models::{ScheduleWarning, Task};

/// Fatal problems with the shape of a task set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },
}

/// Indexed, resolved dependency structure. Borrows the input tasks.
#[derive(Debug)]
pub struct TaskGraph<'a> {
    tasks: &'a [Task],
    index: TaskIndex<'a>,
    /// Resolved predecessors per task.
    deps: Vec<Vec<TaskIdx>>,
    /// Tasks listing this task as a predecessor.
    dependents: Vec<Vec<TaskIdx>>,
    dangling: Vec<ScheduleWarning>,
}

impl<'a> TaskGraph<'a> {
    /// Index `tasks` and resolve their dependency lists.
    ///
    /// Dependency IDs not present in the set are dropped and recorded as
    /// dangling references. Repeated IDs in one list count once.
    pub fn build(tasks: &'a [Task]) -> Result<Self, GraphError> {
        let mut index = TaskIndex::with_capacity(tasks.len());
        for task in tasks {
            if index.insert(&task.id).is_err() {
                return Err(GraphError::DuplicateTaskId(task.id.clone()));
            }
        }

        let n = tasks.len();
        let mut deps: Vec<Vec<TaskIdx>> = vec![Vec::new(); n];
        let mut dependents: Vec<Vec<TaskIdx>> = vec![Vec::new(); n];
        let mut dangling = Vec::new();

        for (idx, task) in tasks.iter().enumerate() {
            for dep_id in &task.dependencies {
                match index.get(dep_id) {
                    Some(dep_idx) => {
                        if !deps[idx].contains(&dep_idx) {
                            deps[idx].push(dep_idx);
                            dependents[dep_idx].push(idx);
                        }
                    }
                    None => dangling.push(ScheduleWarning::DanglingDependency {
                        task_id: task.id.clone(),
                        dependency_id: dep_id.clone(),
                    }),
                }
            }
        }

        Ok(Self {
            tasks,
            index,
            deps,
            dependents,
            dangling,
        })
    }

    /// Number of tasks in the arena.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the task set is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task stored at an arena slot.
    #[inline]
    pub fn task(&self, idx: TaskIdx) -> &'a Task {
        &self.tasks[idx]
    }

    /// Resolved predecessors of a task, without dangling or repeated IDs.
    #[inline]
    pub fn deps(&self, idx: TaskIdx) -> &[TaskIdx] {
        &self.deps[idx]
    }

    /// Tasks that list this one as a predecessor.
    #[inline]
    pub fn dependents(&self, idx: TaskIdx) -> &[TaskIdx] {
        &self.dependents[idx]
    }

    /// ID to slot lookup for this run.
    pub fn index(&self) -> &TaskIndex<'a> {
        &self.index
    }

    /// Dependency references dropped during [`TaskGraph::build`], in input order.
    pub fn dangling(&self) -> &[ScheduleWarning] {
        &self.dangling
    }

    /// Reject the graph if any resolved dependency chain loops back on itself.
    pub fn check_acyclic(&self) -> Result<(), GraphError> {
        match self.find_cycle() {
            Some(cycle) => Err(GraphError::CircularDependency { cycle }),
            None => Ok(()),
        }
    }

    /// Find one dependency cycle, if any, as task IDs with the first ID repeated
    /// at the end. A self-dependency yields `[x, x]`.
    ///
    /// Iterative three-colour depth-first walk along predecessor edges.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let n = self.len();
        let mut marks = vec![Mark::Unvisited; n];
        // (task, position of the next predecessor to visit)
        let mut stack: Vec<(TaskIdx, usize)> = Vec::new();

        for root in 0..n {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::OnStack;
            stack.push((root, 0));

            while let Some(&(node, next)) = stack.last() {
                let Some(&dep) = self.deps[node].get(next) else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                match marks[dep] {
                    Mark::Unvisited => {
                        marks[dep] = Mark::OnStack;
                        stack.push((dep, 0));
                    }
                    Mark::OnStack => {
                        let start = stack
                            .iter()
                            .position(|&(idx, _)| idx == dep)
                            .unwrap_or(0);
                        let mut cycle: Vec<String> = stack[start..]
                            .iter()
                            .map(|&(idx, _)| self.tasks[idx].id.clone())
                            .collect();
                        cycle.push(self.tasks[dep].id.clone());
                        return Some(cycle);
                    }
                    Mark::Done => {}
                }
            }
        }

        None
    }

    /// Order tasks so every predecessor precedes its dependents (Kahn's algorithm).
    ///
    /// Ties keep input order.
    pub fn topological_order(&self) -> Result<Vec<TaskIdx>, GraphError> {
        let n = self.len();
        let mut in_degree: Vec<usize> = self.deps.iter().map(Vec::len).collect();
        let mut queue: VecDeque<TaskIdx> = (0..n).filter(|&idx| in_degree[idx] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            for &dependent in &self.dependents[idx] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() != n {
            let cycle = self.find_cycle().unwrap_or_default();
            return Err(GraphError::CircularDependency { cycle });
        }

        Ok(order)
    }
}
