//! Task domain model.
//!
//! # Responsibility
//! - Define the single persistent record rendered by every task column.
//! - Own the per-task deferral state machine (`idle -> deferring -> deferred`).
//!
//! # Invariants
//! - `id` never changes after creation.
//! - `title` and `timestamp` are immutable after creation.
//! - A task is never both deferring and resolved; `DeferState` makes the
//!   two phases mutually exclusive by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Ordinal task identifier, unique within one task list.
pub type TaskId = i64;

/// Lifecycle category; selects the column a task renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Actionable now.
    Current,
    /// Pushed back until a later instant.
    Deferred,
    /// Completed.
    Done,
    /// Queued for removal.
    Delete,
}

impl TaskType {
    /// All categories in navigation order.
    pub const ALL: [TaskType; 4] = [
        TaskType::Current,
        TaskType::Deferred,
        TaskType::Done,
        TaskType::Delete,
    ];

    /// Stable wire label (`CURRENT|DEFERRED|DONE|DELETE`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "CURRENT",
            Self::Deferred => "DEFERRED",
            Self::Done => "DONE",
            Self::Delete => "DELETE",
        }
    }
}

impl Display for TaskType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a label does not name a known `TaskType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTaskTypeError(pub String);

impl Display for ParseTaskTypeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown task type `{}`; expected CURRENT|DEFERRED|DONE|DELETE",
            self.0
        )
    }
}

impl Error for ParseTaskTypeError {}

impl FromStr for TaskType {
    type Err = ParseTaskTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CURRENT" => Ok(Self::Current),
            "DEFERRED" => Ok(Self::Deferred),
            "DONE" => Ok(Self::Done),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ParseTaskTypeError(value.to_string())),
        }
    }
}

/// Per-task deferral phase.
///
/// Deferral is two-phase: tasks are first marked `Deferring`, then every
/// deferring task is resolved together once the target instant is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeferState {
    /// No deferral in flight and none resolved.
    #[default]
    Idle,
    /// Marked for deferral; the target instant is not yet known.
    ///
    /// `resumes` keeps a previously resolved instant so that cancelling the
    /// in-flight deferral restores it.
    Deferring {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resumes: Option<DateTime<Utc>>,
    },
    /// Deferral resolved to a concrete instant.
    Deferred { until: DateTime<Utc> },
}

/// The sole persistent entity of the to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Creation instant, ISO-8601 on the wire.
    pub timestamp: DateTime<Utc>,
    /// Serialized as `type` to match the descriptor wire shape.
    #[serde(rename = "type")]
    pub kind: TaskType,
    #[serde(default)]
    pub defer: DeferState,
    /// Marks tasks needing re-evaluation without removing them.
    #[serde(default)]
    pub invalidated: bool,
}

impl Task {
    /// Creates a `CURRENT` task with no deferral in flight.
    pub fn new(id: TaskId, title: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            timestamp,
            kind: TaskType::Current,
            defer: DeferState::Idle,
            invalidated: false,
        }
    }

    pub fn is_deferring(&self) -> bool {
        matches!(self.defer, DeferState::Deferring { .. })
    }

    /// Returns the resolved deferral instant, if any.
    pub fn deferred_until(&self) -> Option<DateTime<Utc>> {
        match self.defer {
            DeferState::Deferred { until } => Some(until),
            DeferState::Idle | DeferState::Deferring { .. } => None,
        }
    }

    /// Enters the deferring phase. Already-deferring tasks are unchanged.
    pub fn mark_deferring(&mut self) {
        self.defer = match self.defer {
            DeferState::Idle => DeferState::Deferring { resumes: None },
            DeferState::Deferred { until } => DeferState::Deferring {
                resumes: Some(until),
            },
            deferring @ DeferState::Deferring { .. } => deferring,
        };
    }

    /// Leaves the deferring phase without resolving it.
    pub fn clear_deferring(&mut self) {
        if let DeferState::Deferring { resumes } = self.defer {
            self.defer = match resumes {
                Some(until) => DeferState::Deferred { until },
                None => DeferState::Idle,
            };
        }
    }

    /// Resolves an in-flight deferral to `until`.
    ///
    /// Returns `false` and leaves the task untouched when it is not deferring.
    /// A missing `until` drops back to `Idle`, discarding any earlier instant.
    pub fn resolve_deferral(&mut self, until: Option<DateTime<Utc>>) -> bool {
        if !self.is_deferring() {
            return false;
        }
        self.defer = match until {
            Some(until) => DeferState::Deferred { until },
            None => DeferState::Idle,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{DeferState, Task, TaskType};
    use chrono::{TimeZone, Utc};

    #[test]
    fn task_type_parses_case_insensitively() {
        assert_eq!("done".parse::<TaskType>().unwrap(), TaskType::Done);
        assert_eq!(" Deferred ".parse::<TaskType>().unwrap(), TaskType::Deferred);
        let err = "TEST".parse::<TaskType>().unwrap_err();
        assert!(err.to_string().contains("TEST"));
    }

    #[test]
    fn clear_deferring_restores_previous_instant() {
        let until = Utc.with_ymd_and_hms(2015, 10, 21, 17, 29, 0).unwrap();
        let mut task = Task::new(1, "t", Utc.timestamp_opt(0, 0).unwrap());
        task.defer = DeferState::Deferred { until };

        task.mark_deferring();
        assert!(task.is_deferring());
        assert_eq!(task.deferred_until(), None);

        task.clear_deferring();
        assert_eq!(task.deferred_until(), Some(until));
    }

    #[test]
    fn resolve_deferral_ignores_idle_tasks() {
        let until = Utc.with_ymd_and_hms(2015, 10, 21, 17, 29, 0).unwrap();
        let mut task = Task::new(1, "t", Utc.timestamp_opt(0, 0).unwrap());

        assert!(!task.resolve_deferral(Some(until)));
        assert_eq!(task.defer, DeferState::Idle);
    }
}
