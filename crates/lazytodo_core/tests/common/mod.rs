#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use lazytodo_core::{
    Descriptor, Dispatch, Notification, NotificationError, NotificationResult,
    NotificationScheduler, Task, TaskState,
};
use std::cell::RefCell;

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn state_with(tasks: &[(i64, &str)]) -> TaskState {
    let mut state = TaskState::empty();
    for (id, title) in tasks {
        state.tasks.push(Task::new(*id, *title, at(0)));
    }
    state
}

/// Dispatcher over a fixed snapshot that records what it is given.
pub struct RecordingDispatch {
    pub snapshot: TaskState,
    pub dispatched: Vec<Descriptor>,
}

impl RecordingDispatch {
    pub fn new(snapshot: TaskState) -> Self {
        Self {
            snapshot,
            dispatched: Vec::new(),
        }
    }
}

impl Dispatch for RecordingDispatch {
    fn dispatch(&mut self, descriptor: Descriptor) {
        self.dispatched.push(descriptor);
    }

    fn state(&self) -> &TaskState {
        &self.snapshot
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    Schedule(String, Notification),
    Cancel(String),
}

#[derive(Default)]
pub struct RecordingScheduler {
    pub calls: RefCell<Vec<SchedulerCall>>,
    pub fail: bool,
}

impl RecordingScheduler {
    pub fn failing() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.calls.borrow().clone()
    }
}

impl NotificationScheduler for RecordingScheduler {
    fn schedule(&self, key: &str, notification: &Notification) -> NotificationResult<()> {
        self.calls
            .borrow_mut()
            .push(SchedulerCall::Schedule(key.to_string(), notification.clone()));
        if self.fail {
            return Err(NotificationError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    fn cancel(&self, key: &str) -> NotificationResult<()> {
        self.calls
            .borrow_mut()
            .push(SchedulerCall::Cancel(key.to_string()));
        if self.fail {
            return Err(NotificationError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}
