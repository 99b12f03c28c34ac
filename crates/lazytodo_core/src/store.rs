//! Single-owner task store.
//!
//! # Responsibility
//! - Own the current `TaskState` and replace it once per descriptor.
//! - Notify rendering listeners after every applied descriptor.
//!
//! # Invariants
//! - State is replaced atomically per descriptor; listeners never observe a
//!   partially applied transition.

use crate::action::Dispatch;
use crate::descriptor::Descriptor;
use crate::model::state::TaskState;
use crate::model::task::Task;
use crate::reducer::reduce;
use log::debug;

/// Callback invoked with the new state after each dispatch.
pub type Listener = Box<dyn FnMut(&TaskState) + Send>;

pub struct TaskStore {
    state: TaskState,
    listeners: Vec<Listener>,
}

impl TaskStore {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener; it is first called on the next dispatch.
    pub fn subscribe(&mut self, listener: impl FnMut(&TaskState) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Tasks in the currently selected column.
    pub fn visible_tasks(&self) -> Vec<Task> {
        self.state.visible_tasks().cloned().collect()
    }

    pub fn into_state(self) -> TaskState {
        self.state
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(TaskState::default())
    }
}

impl Dispatch for TaskStore {
    fn dispatch(&mut self, descriptor: Descriptor) {
        self.state = reduce(&self.state, &descriptor);
        debug!(
            "event=dispatch module=store kind={} task_count={}",
            descriptor.kind(),
            self.state.tasks.len()
        );
        for listener in &mut self.listeners {
            listener(&self.state);
        }
    }

    fn state(&self) -> &TaskState {
        &self.state
    }
}
