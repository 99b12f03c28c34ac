//! Task reducer: the single place task-list invariants are enforced.
//!
//! # Invariants
//! - `reduce` is pure; the input snapshot is never mutated.
//! - Descriptors naming a missing task id are silent no-ops.
//! - Descriptor kinds without a transition return the state unchanged.

use crate::descriptor::Descriptor;
use crate::model::state::TaskState;
use crate::model::task::Task;

/// Applies one descriptor to `state` and returns the next state.
pub fn reduce(state: &TaskState, descriptor: &Descriptor) -> TaskState {
    match descriptor {
        // Any `Some(id)` invalidates every task and `None` invalidates none;
        // the second clause never widens the first.
        Descriptor::SetInvalidated { id } => map_tasks(state, |task| {
            if id.is_some() || *id == Some(task.id) {
                task.invalidated = true;
            }
        }),
        Descriptor::ChangeFilterType { filter_type } => TaskState {
            filter_type: *filter_type,
            ..state.clone()
        },
        Descriptor::AddTask { task } => {
            let mut next = state.clone();
            next.tasks.push(task.clone());
            next
        }
        Descriptor::RemoveTask { id } => TaskState {
            tasks: state
                .tasks
                .iter()
                .filter(|task| task.id != *id)
                .cloned()
                .collect(),
            filter_type: state.filter_type,
        },
        Descriptor::ChangeTaskType { task: change } => map_tasks(state, |task| {
            if task.id == change.id {
                task.kind = change.kind;
            }
        }),
        Descriptor::SetDeferringTask { id } => map_tasks(state, |task| {
            if task.id == *id {
                task.mark_deferring();
            }
        }),
        Descriptor::ClearDeferringTask => map_tasks(state, Task::clear_deferring),
        // Resolves every deferring task, not only `id`: tasks are marked
        // in a batch and resolved together.
        Descriptor::DeferTask { until, .. } => map_tasks(state, |task| {
            task.resolve_deferral(*until);
        }),
        Descriptor::ChangeNextTaskType { .. }
        | Descriptor::StopAnimating { .. }
        | Descriptor::UpdatePermissions { .. }
        | Descriptor::CleanTasks => state.clone(),
    }
}

fn map_tasks(state: &TaskState, mut update: impl FnMut(&mut Task)) -> TaskState {
    TaskState {
        tasks: state
            .tasks
            .iter()
            .map(|task| {
                let mut task = task.clone();
                update(&mut task);
                task
            })
            .collect(),
        filter_type: state.filter_type,
    }
}

#[cfg(test)]
mod tests {
    use super::reduce;
    use crate::descriptor::{Descriptor, TaskTypeChange};
    use crate::model::state::TaskState;
    use crate::model::task::{DeferState, Task, TaskType};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn state_with(ids: &[i64]) -> TaskState {
        let mut state = TaskState::empty();
        for id in ids {
            state.tasks.push(Task::new(*id, format!("task {id}"), at(0)));
        }
        state
    }

    #[test]
    fn remove_task_is_idempotent() {
        let state = state_with(&[0, 1, 2]);
        let remove = Descriptor::RemoveTask { id: 1 };

        let once = reduce(&state, &remove);
        let twice = reduce(&once, &remove);

        assert_eq!(once, twice);
        let ids: Vec<_> = once.tasks.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn clear_deferring_is_idempotent() {
        let mut state = state_with(&[0, 1]);
        state.tasks[1].mark_deferring();

        let once = reduce(&state, &Descriptor::ClearDeferringTask);
        let twice = reduce(&once, &Descriptor::ClearDeferringTask);

        assert_eq!(once, twice);
        assert!(once.tasks.iter().all(|task| !task.is_deferring()));
    }

    #[test]
    fn change_task_type_updates_only_type() {
        let state = state_with(&[0, 1]);
        let next = reduce(
            &state,
            &Descriptor::ChangeTaskType {
                task: TaskTypeChange {
                    id: 1,
                    kind: TaskType::Done,
                    is_animating: true,
                },
            },
        );

        let mut expected = state.tasks[1].clone();
        expected.kind = TaskType::Done;
        assert_eq!(next.tasks[1], expected);
        assert_eq!(next.tasks[0], state.tasks[0]);
    }

    #[test]
    fn defer_task_resolves_every_deferring_task() {
        let mut state = state_with(&[1, 2, 3]);
        state.tasks[0].mark_deferring();
        state.tasks[1].mark_deferring();
        let until = at(86_400);

        let next = reduce(
            &state,
            &Descriptor::DeferTask {
                id: 1,
                until: Some(until),
                is_animating: false,
            },
        );

        assert_eq!(next.tasks[0].defer, DeferState::Deferred { until });
        assert_eq!(next.tasks[1].defer, DeferState::Deferred { until });
        assert_eq!(next.tasks[2].defer, DeferState::Idle);
    }

    #[test]
    fn defer_task_without_until_returns_to_idle() {
        let mut state = state_with(&[1]);
        state.tasks[0].mark_deferring();

        let next = reduce(
            &state,
            &Descriptor::DeferTask {
                id: 1,
                until: None,
                is_animating: false,
            },
        );

        assert_eq!(next.tasks[0].defer, DeferState::Idle);
    }

    #[test]
    fn set_invalidated_with_any_id_marks_every_task() {
        let state = state_with(&[0, 1]);
        let next = reduce(&state, &Descriptor::SetInvalidated { id: Some(1) });
        assert!(next.tasks.iter().all(|task| task.invalidated));

        let unknown = reduce(&state, &Descriptor::SetInvalidated { id: Some(42) });
        assert!(unknown.tasks.iter().all(|task| task.invalidated));
    }

    #[test]
    fn set_invalidated_without_id_marks_nothing() {
        let state = state_with(&[0, 1]);
        let next = reduce(&state, &Descriptor::SetInvalidated { id: None });
        assert_eq!(next, state);
    }

    #[test]
    fn missing_ids_and_passive_kinds_leave_state_unchanged() {
        let state = state_with(&[0]);
        for descriptor in [
            Descriptor::RemoveTask { id: 42 },
            Descriptor::SetDeferringTask { id: 42 },
            Descriptor::StopAnimating { id: 0 },
            Descriptor::CleanTasks,
            Descriptor::ChangeNextTaskType {
                id: 0,
                next_type: TaskType::Done,
            },
        ] {
            assert_eq!(reduce(&state, &descriptor), state, "{}", descriptor.kind());
        }
    }

    #[test]
    fn add_task_appends_in_order() {
        let state = state_with(&[0]);
        let next = reduce(
            &state,
            &Descriptor::AddTask {
                task: Task::new(1, "second", at(10)),
            },
        );
        assert_eq!(next.tasks.len(), 2);
        assert_eq!(next.tasks[1].title, "second");
        assert_eq!(state.tasks.len(), 1);
    }
}
