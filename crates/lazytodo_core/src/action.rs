//! Action layer: turns caller intent into transition descriptors.
//!
//! # Responsibility
//! - Map plain intents to descriptors (pure creators).
//! - Derive fields from current state before dispatching (state-reading
//!   actions), through an injected `Dispatch` capability.
//! - Drive the notification side effect of deferral through an injected
//!   `NotificationScheduler`.
//!
//! # Invariants
//! - Input is not validated; malformed intent yields a malformed descriptor.
//! - Multi-descriptor actions dispatch in order, synchronously.
//! - Scheduler failures never abort an action.

use crate::descriptor::{Descriptor, TaskTypeChange};
use crate::model::state::TaskState;
use crate::model::task::{Task, TaskId, TaskType};
use crate::notification::{notification_key, Notification, NotificationScheduler};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Dispatch + state-read capability supplied by the state owner.
pub trait Dispatch {
    /// Applies one descriptor to the owned state.
    fn dispatch(&mut self, descriptor: Descriptor);
    /// Current state snapshot.
    fn state(&self) -> &TaskState;
}

impl<D: Dispatch + ?Sized> Dispatch for &mut D {
    fn dispatch(&mut self, descriptor: Descriptor) {
        (**self).dispatch(descriptor);
    }

    fn state(&self) -> &TaskState {
        (**self).state()
    }
}

/// Intent to create a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Used only when the list is empty; otherwise `max + 1` wins.
    pub id: Option<TaskId>,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: title.into(),
            timestamp,
        }
    }
}

/// Intent to resolve the in-flight deferral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferRequest {
    pub id: TaskId,
    pub until: Option<DateTime<Utc>>,
    pub animated: bool,
}

pub fn change_filter_type(filter_type: TaskType) -> Descriptor {
    Descriptor::ChangeFilterType { filter_type }
}

/// The rendering side uses `is_animating` to play the column transition.
pub fn change_task_type(id: TaskId, kind: TaskType) -> Descriptor {
    Descriptor::ChangeTaskType {
        task: TaskTypeChange {
            id,
            kind,
            is_animating: true,
        },
    }
}

pub fn change_next_task_type(id: TaskId, next_type: TaskType) -> Descriptor {
    Descriptor::ChangeNextTaskType { id, next_type }
}

pub fn remove_task(id: TaskId) -> Descriptor {
    Descriptor::RemoveTask { id }
}

pub fn set_deferring_task(id: TaskId) -> Descriptor {
    Descriptor::SetDeferringTask { id }
}

pub fn clear_deferring_task() -> Descriptor {
    Descriptor::ClearDeferringTask
}

pub fn stop_animating(id: TaskId) -> Descriptor {
    Descriptor::StopAnimating { id }
}

/// Pass-through; keys and values are not inspected.
pub fn update_permissions(permissions: BTreeMap<String, String>) -> Descriptor {
    Descriptor::UpdatePermissions { permissions }
}

/// Any `Some(id)` marks every task invalidated; `None` marks none.
pub fn set_invalidated(id: Option<TaskId>) -> Descriptor {
    Descriptor::SetInvalidated { id }
}

/// Adds a `CURRENT` task, assigning its id from the current list.
///
/// Returns the assigned id.
pub fn add_task<D: Dispatch + ?Sized>(dispatch: &mut D, input: NewTask) -> TaskId {
    let id = dispatch.state().next_task_id(input.id.unwrap_or(0));
    dispatch.dispatch(Descriptor::AddTask {
        task: Task::new(id, input.title, input.timestamp),
    });
    id
}

/// Dispatches `CLEAN_TASKS`, then the filter change.
pub fn change_filter_type_with_cleanup<D: Dispatch + ?Sized>(
    dispatch: &mut D,
    filter_type: TaskType,
) {
    dispatch.dispatch(Descriptor::CleanTasks);
    dispatch.dispatch(change_filter_type(filter_type));
}

/// Resolves the in-flight deferral and schedules its notification.
///
/// The notification is keyed by `request.id` and carries that task's title.
/// Nothing is scheduled when `until` is `None` or the task is missing.
pub fn defer_task<D, S>(dispatch: &mut D, scheduler: &S, request: DeferRequest)
where
    D: Dispatch + ?Sized,
    S: NotificationScheduler + ?Sized,
{
    let title = dispatch
        .state()
        .find(request.id)
        .map(|task| task.title.clone());

    dispatch.dispatch(Descriptor::DeferTask {
        id: request.id,
        until: request.until,
        is_animating: request.animated,
    });

    let Some(until) = request.until else {
        return;
    };
    let Some(title) = title else {
        warn!(
            "event=defer_notify module=action status=skipped reason=task_missing task_id={}",
            request.id
        );
        return;
    };

    let notification = Notification::deferred_task(&title, until);
    match scheduler.schedule(&notification_key(request.id), &notification) {
        Ok(()) => debug!(
            "event=defer_notify module=action status=ok task_id={} fire_at_ms={}",
            request.id,
            until.timestamp_millis()
        ),
        Err(err) => warn!(
            "event=defer_notify module=action status=error task_id={} error={}",
            request.id, err
        ),
    }
}

/// Cancels a task's scheduled notification. Dispatches nothing.
pub fn cancel_notification<S: NotificationScheduler + ?Sized>(scheduler: &S, id: TaskId) {
    if let Err(err) = scheduler.cancel(&notification_key(id)) {
        warn!(
            "event=cancel_notify module=action status=error task_id={} error={}",
            id, err
        );
    }
}
