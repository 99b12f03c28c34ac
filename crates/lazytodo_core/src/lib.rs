//! Core domain logic for LazyTodo.
//! The reducer in this crate is the single source of truth for task-list
//! invariants; UI hosts only dispatch intents and render snapshots.

pub mod action;
pub mod db;
pub mod defer;
pub mod descriptor;
pub mod logging;
pub mod model;
pub mod notification;
pub mod reducer;
pub mod store;

pub use action::{DeferRequest, Dispatch, NewTask};
pub use defer::{DeferPreset, DeferSchedule, ParseDeferPresetError};
pub use descriptor::{Descriptor, TaskTypeChange};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::state::TaskState;
pub use model::task::{DeferState, ParseTaskTypeError, Task, TaskId, TaskType};
pub use notification::outbox::ScheduledNotification;
pub use notification::{
    Notification, NotificationError, NotificationResult, NotificationScheduler,
    SqliteNotificationScheduler,
};
pub use reducer::reduce;
pub use store::TaskStore;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
