//! Transition descriptors consumed by the reducer.
//!
//! # Responsibility
//! - Describe every state transition as plain data.
//! - Keep a stable JSON wire shape (`{"type": "ADD_TASK", ...}`) for host
//!   devtools and replay.
//!
//! # Invariants
//! - Descriptors carry no behavior; only `reducer::reduce` interprets them.

use crate::model::task::{Task, TaskId, TaskType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payload of `CHANGE_TASK_TYPE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTypeChange {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub kind: TaskType,
    /// Render hint only; the reducer does not copy it into state.
    pub is_animating: bool,
}

/// A data-only description of one state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Descriptor {
    SetInvalidated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<TaskId>,
    },
    ChangeFilterType {
        #[serde(rename = "filterType")]
        filter_type: TaskType,
    },
    AddTask {
        task: Task,
    },
    RemoveTask {
        id: TaskId,
    },
    ChangeTaskType {
        task: TaskTypeChange,
    },
    ChangeNextTaskType {
        id: TaskId,
        #[serde(rename = "nextType")]
        next_type: TaskType,
    },
    SetDeferringTask {
        id: TaskId,
    },
    ClearDeferringTask,
    DeferTask {
        id: TaskId,
        #[serde(default)]
        until: Option<DateTime<Utc>>,
        #[serde(rename = "isAnimating")]
        is_animating: bool,
    },
    StopAnimating {
        id: TaskId,
    },
    UpdatePermissions {
        permissions: BTreeMap<String, String>,
    },
    CleanTasks,
}

impl Descriptor {
    /// Wire kind label, used for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetInvalidated { .. } => "SET_INVALIDATED",
            Self::ChangeFilterType { .. } => "CHANGE_FILTER_TYPE",
            Self::AddTask { .. } => "ADD_TASK",
            Self::RemoveTask { .. } => "REMOVE_TASK",
            Self::ChangeTaskType { .. } => "CHANGE_TASK_TYPE",
            Self::ChangeNextTaskType { .. } => "CHANGE_NEXT_TASK_TYPE",
            Self::SetDeferringTask { .. } => "SET_DEFERRING_TASK",
            Self::ClearDeferringTask => "CLEAR_DEFERRING_TASK",
            Self::DeferTask { .. } => "DEFER_TASK",
            Self::StopAnimating { .. } => "STOP_ANIMATING",
            Self::UpdatePermissions { .. } => "UPDATE_PERMISSIONS",
            Self::CleanTasks => "CLEAN_TASKS",
        }
    }
}
