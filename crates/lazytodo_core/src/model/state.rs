//! Application task state.
//!
//! # Invariants
//! - Task ids are unique within `tasks`.
//! - `tasks` keeps append order; no transition reorders it.

use crate::model::task::{Task, TaskId, TaskType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title of the seed task every fresh install starts with.
pub const SEED_TASK_TITLE: &str = "Create a new task";

/// Whole task-list state owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    pub tasks: Vec<Task>,
    /// Category currently selected for display.
    pub filter_type: TaskType,
}

impl TaskState {
    /// State with no tasks and the `CURRENT` column selected.
    pub fn empty() -> Self {
        Self {
            tasks: Vec::new(),
            filter_type: TaskType::Current,
        }
    }

    /// First-launch state: a single seed task with id `0`.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            tasks: vec![Task::new(0, SEED_TASK_TITLE, now)],
            filter_type: TaskType::Current,
        }
    }

    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Next ordinal id: `max + 1`, or `fallback` when the list is empty.
    ///
    /// When `max` is `TaskId::MAX` the smallest unused non-negative id is
    /// returned instead.
    pub fn next_task_id(&self, fallback: TaskId) -> TaskId {
        let Some(max) = self.tasks.iter().map(|task| task.id).max() else {
            return fallback;
        };
        max.checked_add(1).unwrap_or_else(|| self.smallest_unused_id())
    }

    // Fewer than `TaskId::MAX` tasks can exist, so a free id is always found.
    fn smallest_unused_id(&self) -> TaskId {
        let mut used: Vec<TaskId> = self
            .tasks
            .iter()
            .map(|task| task.id)
            .filter(|id| *id >= 0)
            .collect();
        used.sort_unstable();
        used.dedup();
        let mut candidate = 0;
        for id in used {
            if id != candidate {
                break;
            }
            candidate += 1;
        }
        candidate
    }

    /// Tasks whose category matches the selected filter, in list order.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks
            .iter()
            .filter(move |task| task.kind == self.filter_type)
    }
}

impl Default for TaskState {
    fn default() -> Self {
        Self::initial(Utc::now())
    }
}
