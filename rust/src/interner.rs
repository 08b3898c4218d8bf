//! Dense task indexing for array-based passes.
//!
//! Maps string task IDs to `usize` slots assigned once per scheduler run, in
//! input order, so every pass can work on plain vectors.

use rustc_hash::FxHashMap;

/// Position of a task in the per-run arena.
pub type TaskIdx = usize;

/// Borrowing map from task ID strings to arena slots.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex<'a> {
    slots: FxHashMap<&'a str, TaskIdx>,
}

impl<'a> TaskIndex<'a> {
    /// Create a new index with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Assign the next slot to `id`.
    ///
    /// Returns `Err` with the existing slot if `id` was already inserted.
    pub fn insert(&mut self, id: &'a str) -> Result<TaskIdx, TaskIdx> {
        if let Some(&idx) = self.slots.get(id) {
            return Err(idx);
        }
        let idx = self.slots.len();
        self.slots.insert(id, idx);
        Ok(idx)
    }

    /// Look up the slot for a task ID.
    ///
    /// Returns `None` for IDs outside the task set (dangling references).
    #[inline]
    pub fn get(&self, id: &str) -> Option<TaskIdx> {
        self.slots.get(id).copied()
    }

    /// Number of indexed tasks; also the next slot to be assigned.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no task has been indexed yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_slots_in_order() {
        let mut index = TaskIndex::with_capacity(4);
        assert!(index.is_empty());

        let a = index.insert("task_a").unwrap();
        let b = index.insert("task_b").unwrap();

        assert_eq!((a, b), (0, 1));
        assert_eq!(index.insert("task_a"), Err(a)); // duplicate keeps first slot
        assert_eq!(index.len(), 2);

        assert_eq!(index.get("task_b"), Some(b));
        assert_eq!(index.get("nonexistent"), None);
    }
}
