//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Own the process-wide task store and expose intents to Dart via FRB.
//! - Bridge deferral notifications into the SQLite outbox the host polls.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every mutation goes through the core action layer and reducer.
//! - Instants cross the boundary as Unix epoch milliseconds.

use chrono::{DateTime, FixedOffset, Utc};
use lazytodo_core::action::{self, DeferRequest, NewTask};
use lazytodo_core::db::open_db;
use lazytodo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DeferPreset, DeferSchedule, Dispatch, ScheduledNotification, SqliteNotificationScheduler,
    Task, TaskId, TaskStore, TaskType,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

const OUTBOX_DB_FILE_NAME: &str = "lazytodo_outbox.sqlite3";
static OUTBOX_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE: OnceLock<Mutex<TaskStore>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Task row as rendered by the Flutter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub id: i64,
    pub title: String,
    pub created_at_ms: i64,
    /// `CURRENT|DEFERRED|DONE|DELETE`.
    pub task_type: String,
    pub deferring: bool,
    pub deferred_until_ms: Option<i64>,
    pub invalidated: bool,
}

/// Snapshot of the list for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    pub filter_type: String,
    pub tasks: Vec<TaskView>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    /// Task the action created or targeted, when there is one.
    pub task_id: Option<i64>,
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task_id: Option<TaskId>) -> Self {
        Self {
            ok: true,
            task_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Notification the host should present now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueNotification {
    pub key: String,
    pub title: String,
    pub message: String,
    pub sub_text: String,
    pub fire_at_ms: i64,
    pub small_icon: String,
    pub color: String,
    pub vibration_ms: Option<u32>,
}

/// Lists tasks in `filter_type`, or in the store's selected column.
///
/// # FFI contract
/// - `None` lists the selected column.
/// - Unknown filter labels return `ok = false` with no tasks.
#[flutter_rust_bridge::frb(sync)]
pub fn list_tasks(filter_type: Option<String>) -> TaskListResponse {
    let store = lock_store();
    let filter = match filter_type {
        None => store.state().filter_type,
        Some(label) => match label.parse::<TaskType>() {
            Ok(kind) => kind,
            Err(err) => {
                return TaskListResponse {
                    ok: false,
                    filter_type: label,
                    tasks: Vec::new(),
                    message: format!("list_tasks failed: {err}"),
                };
            }
        },
    };
    TaskListResponse {
        ok: true,
        filter_type: filter.to_string(),
        tasks: store
            .state()
            .tasks
            .iter()
            .filter(|task| task.kind == filter)
            .map(to_task_view)
            .collect(),
        message: String::new(),
    }
}

/// Adds a `CURRENT` task stamped with the current time.
#[flutter_rust_bridge::frb(sync)]
pub fn add_task(title: String) -> TaskActionResponse {
    let title = title.trim().to_string();
    if title.is_empty() {
        return TaskActionResponse::failure("add_task failed: title is empty");
    }
    let mut store = lock_store();
    let id = action::add_task(&mut *store, NewTask::new(title, Utc::now()));
    TaskActionResponse::success("Task added.", Some(id))
}

/// Removes a task and cancels its pending notification.
#[flutter_rust_bridge::frb(sync)]
pub fn remove_task(id: i64) -> TaskActionResponse {
    lock_store().dispatch(action::remove_task(id));
    cancel_notifications(&[id], "remove_task");
    TaskActionResponse::success("Task removed.", Some(id))
}

/// Moves a task to another column.
///
/// Leaving `DEFERRED` cancels the task's pending notification.
#[flutter_rust_bridge::frb(sync)]
pub fn change_task_type(id: i64, task_type: String) -> TaskActionResponse {
    match task_type.parse::<TaskType>() {
        Ok(kind) => {
            lock_store().dispatch(action::change_task_type(id, kind));
            if kind != TaskType::Deferred {
                cancel_notifications(&[id], "change_task_type");
            }
            TaskActionResponse::success("Task moved.", Some(id))
        }
        Err(err) => TaskActionResponse::failure(format!("change_task_type failed: {err}")),
    }
}

/// Selects the visible column, cleaning up first.
#[flutter_rust_bridge::frb(sync)]
pub fn change_filter_type(filter_type: String) -> TaskActionResponse {
    match filter_type.parse::<TaskType>() {
        Ok(kind) => {
            action::change_filter_type_with_cleanup(&mut *lock_store(), kind);
            TaskActionResponse::success("Filter changed.", None)
        }
        Err(err) => TaskActionResponse::failure(format!("change_filter_type failed: {err}")),
    }
}

/// Marks a task as about to be deferred (defer picker opened).
#[flutter_rust_bridge::frb(sync)]
pub fn begin_defer(id: i64) -> TaskActionResponse {
    lock_store().dispatch(action::set_deferring_task(id));
    TaskActionResponse::success("Deferral started.", Some(id))
}

/// Abandons every in-flight deferral (defer picker dismissed).
#[flutter_rust_bridge::frb(sync)]
pub fn cancel_defer() -> TaskActionResponse {
    lock_store().dispatch(action::clear_deferring_task());
    TaskActionResponse::success("Deferral cancelled.", None)
}

/// Resolves in-flight deferrals using a named preset.
///
/// # FFI contract
/// - `preset`: `later_today|this_evening|tomorrow|this_weekend|next_week|someday`.
/// - `utc_offset_minutes`: the device's current offset, used for wall-clock presets.
#[flutter_rust_bridge::frb(sync)]
pub fn defer_task(id: i64, preset: String, utc_offset_minutes: i32) -> TaskActionResponse {
    let preset = match preset.parse::<DeferPreset>() {
        Ok(preset) => preset,
        Err(err) => return TaskActionResponse::failure(format!("defer_task failed: {err}")),
    };
    let Some(offset) = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
    else {
        return TaskActionResponse::failure(format!(
            "defer_task failed: invalid utc offset {utc_offset_minutes} minutes"
        ));
    };
    let now = Utc::now().with_timezone(&offset);
    let until = DeferSchedule::default().resolve(preset, now);
    resolve_deferral(id, until)
}

/// Resolves in-flight deferrals to an explicit instant.
#[flutter_rust_bridge::frb(sync)]
pub fn defer_task_until(id: i64, until_epoch_ms: i64) -> TaskActionResponse {
    match DateTime::<Utc>::from_timestamp_millis(until_epoch_ms) {
        Some(until) => resolve_deferral(id, Some(until)),
        None => TaskActionResponse::failure(format!(
            "defer_task_until failed: instant out of range: {until_epoch_ms}"
        )),
    }
}

/// Flags every task for re-evaluation when the app returns to foreground.
#[flutter_rust_bridge::frb(sync)]
pub fn app_resumed() -> TaskActionResponse {
    let mut store = lock_store();
    // Any id invalidates the whole list; an empty list has nothing to flag.
    if let Some(id) = store.state().tasks.first().map(|task| task.id) {
        store.dispatch(action::set_invalidated(Some(id)));
    }
    TaskActionResponse::success("Tasks invalidated.", None)
}

/// Lists outbox notifications due at `now_epoch_ms`.
///
/// Returns an empty list when the outbox cannot be read.
#[flutter_rust_bridge::frb(sync)]
pub fn due_notifications(now_epoch_ms: i64) -> Vec<DueNotification> {
    let Some(now) = DateTime::<Utc>::from_timestamp_millis(now_epoch_ms) else {
        return Vec::new();
    };
    match with_outbox(|outbox| outbox.due(now).map_err(|err| err.to_string())) {
        Ok(due) => due.into_iter().map(to_due_notification).collect(),
        Err(err) => {
            warn!("event=due_notifications module=ffi status=error error={err}");
            Vec::new()
        }
    }
}

/// Removes a notification once the host has shown it.
#[flutter_rust_bridge::frb(sync)]
pub fn acknowledge_notification(key: String) -> TaskActionResponse {
    match with_outbox(|outbox| outbox.acknowledge(&key).map_err(|err| err.to_string())) {
        Ok(true) => TaskActionResponse::success("Notification acknowledged.", None),
        Ok(false) => TaskActionResponse::failure("acknowledge_notification failed: unknown key"),
        Err(err) => TaskActionResponse::failure(format!("acknowledge_notification failed: {err}")),
    }
}

fn resolve_deferral(id: TaskId, until: Option<DateTime<Utc>>) -> TaskActionResponse {
    let mut store = lock_store();
    let deferring: Vec<TaskId> = store
        .state()
        .tasks
        .iter()
        .filter(|task| task.is_deferring())
        .map(|task| task.id)
        .collect();
    let request = DeferRequest {
        id,
        until,
        animated: true,
    };

    if let Err(err) = with_outbox(|outbox| {
        action::defer_task(&mut *store, outbox, request);
        Ok(())
    }) {
        warn!("event=defer_task module=ffi status=degraded error={err}");
        action::defer_task(&mut *store, &NullScheduler, request);
    }
    // Indefinite deferral drops any reminder left from an earlier deferral.
    if until.is_none() {
        cancel_notifications(&deferring, "defer_task");
    }
    for task_id in deferring {
        store.dispatch(action::change_task_type(task_id, TaskType::Deferred));
    }
    TaskActionResponse::success("Task deferred.", Some(id))
}

fn cancel_notifications(ids: &[TaskId], event: &str) {
    if ids.is_empty() {
        return;
    }
    if let Err(err) = with_outbox(|outbox| {
        for id in ids {
            action::cancel_notification(outbox, *id);
        }
        Ok(())
    }) {
        warn!("event={event} module=ffi status=degraded error={err}");
    }
}

/// Used when the outbox cannot be opened; the deferral still applies.
struct NullScheduler;

impl lazytodo_core::NotificationScheduler for NullScheduler {
    fn schedule(
        &self,
        _key: &str,
        _notification: &lazytodo_core::Notification,
    ) -> lazytodo_core::NotificationResult<()> {
        Ok(())
    }

    fn cancel(&self, _key: &str) -> lazytodo_core::NotificationResult<()> {
        Ok(())
    }
}

fn lock_store() -> MutexGuard<'static, TaskStore> {
    STORE
        .get_or_init(|| Mutex::new(TaskStore::default()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn resolve_outbox_db_path() -> PathBuf {
    OUTBOX_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("LAZYTODO_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(OUTBOX_DB_FILE_NAME)
        })
        .clone()
}

fn with_outbox<T>(
    f: impl FnOnce(&SqliteNotificationScheduler<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(resolve_outbox_db_path())
        .map_err(|err| format!("outbox DB open failed: {err}"))?;
    let outbox = SqliteNotificationScheduler::try_new(&conn)
        .map_err(|err| format!("outbox init failed: {err}"))?;
    f(&outbox)
}

fn to_task_view(task: &Task) -> TaskView {
    TaskView {
        id: task.id,
        title: task.title.clone(),
        created_at_ms: task.timestamp.timestamp_millis(),
        task_type: task.kind.to_string(),
        deferring: task.is_deferring(),
        deferred_until_ms: task.deferred_until().map(|until| until.timestamp_millis()),
        invalidated: task.invalidated,
    }
}

fn to_due_notification(scheduled: ScheduledNotification) -> DueNotification {
    let notification = scheduled.notification;
    DueNotification {
        key: scheduled.key,
        title: notification.title,
        message: notification.message,
        sub_text: notification.sub_text,
        fire_at_ms: notification.fire_at.timestamp_millis(),
        small_icon: notification.style.small_icon,
        color: notification.style.color,
        vibration_ms: notification
            .style
            .vibrate
            .then_some(notification.style.vibration_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        acknowledge_notification, add_task, app_resumed, begin_defer, cancel_defer,
        change_task_type, core_version, defer_task, defer_task_until, due_notifications,
        init_logging, list_tasks, ping, remove_task, TaskView,
    };
    use std::sync::{Mutex, MutexGuard};
    use std::time::{SystemTime, UNIX_EPOCH};

    // Deferral resolves every deferring task in the shared store, so tests
    // that begin or clear deferrals must not interleave.
    static DEFER_GUARD: Mutex<()> = Mutex::new(());

    fn defer_guard() -> MutexGuard<'static, ()> {
        DEFER_GUARD
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn add_task_rejects_blank_title() {
        let response = add_task("   ".to_string());
        assert!(!response.ok);
        assert!(response.task_id.is_none());
    }

    #[test]
    fn added_task_is_listed_in_current_column() {
        let title = unique_token("ffi-add");
        let response = add_task(title.clone());
        assert!(response.ok, "{}", response.message);

        let task = find_task(&title, "CURRENT").expect("task should be listed");
        assert_eq!(Some(task.id), response.task_id);
        assert!(!task.deferring);
    }

    #[test]
    fn change_task_type_rejects_unknown_label() {
        let response = change_task_type(0, "TEST".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("TEST"));
    }

    #[test]
    fn deferral_moves_task_and_fills_outbox() {
        let _guard = defer_guard();
        let title = unique_token("ffi-defer");
        let id = add_task(title.clone()).task_id.expect("id");
        let until_ms = 1_000;

        assert!(begin_defer(id).ok);
        assert!(defer_task_until(id, until_ms).ok);

        let task = find_task(&title, "DEFERRED").expect("task should be deferred");
        assert_eq!(task.deferred_until_ms, Some(until_ms));

        let due = due_notifications(until_ms);
        assert!(due.iter().any(|item| item.key == id.to_string() && item.title == title));

        assert!(acknowledge_notification(id.to_string()).ok);
        assert!(remove_task(id).ok);
        assert!(find_task(&title, "DEFERRED").is_none());
    }

    #[test]
    fn someday_deferral_schedules_nothing() {
        let _guard = defer_guard();
        let title = unique_token("ffi-someday");
        let id = add_task(title.clone()).task_id.expect("id");

        assert!(begin_defer(id).ok);
        assert!(defer_task(id, "someday".to_string(), 0).ok);

        let task = find_task(&title, "DEFERRED").expect("task should be deferred");
        assert_eq!(task.deferred_until_ms, None);
        assert!(due_notifications(4_102_444_800_000)
            .iter()
            .all(|item| item.title != title));
    }

    #[test]
    fn someday_redeferral_cancels_earlier_notification() {
        let _guard = defer_guard();
        let title = unique_token("ffi-redefer");
        let id = add_task(title.clone()).task_id.expect("id");

        assert!(begin_defer(id).ok);
        assert!(defer_task_until(id, 1_000).ok);
        assert!(due_notifications(1_000).iter().any(|item| item.title == title));

        assert!(begin_defer(id).ok);
        assert!(defer_task(id, "someday".to_string(), 0).ok);

        let task = find_task(&title, "DEFERRED").expect("task should stay deferred");
        assert_eq!(task.deferred_until_ms, None);
        assert!(due_notifications(4_102_444_800_000)
            .iter()
            .all(|item| item.title != title));
    }

    #[test]
    fn moving_deferred_task_out_cancels_notification() {
        let _guard = defer_guard();
        let title = unique_token("ffi-undefer");
        let id = add_task(title.clone()).task_id.expect("id");

        assert!(begin_defer(id).ok);
        assert!(defer_task_until(id, 1_000).ok);
        assert!(due_notifications(1_000).iter().any(|item| item.title == title));

        assert!(change_task_type(id, "CURRENT".to_string()).ok);
        assert!(find_task(&title, "CURRENT").is_some());
        assert!(due_notifications(4_102_444_800_000)
            .iter()
            .all(|item| item.title != title));
    }

    #[test]
    fn list_tasks_rejects_unknown_label() {
        let response = list_tasks(Some("ARCHIVED".to_string()));
        assert!(!response.ok);
        assert!(response.tasks.is_empty());
        assert!(response.message.contains("ARCHIVED"));

        assert!(list_tasks(Some("CURRENT".to_string())).ok);
        assert!(list_tasks(None).ok);
    }

    #[test]
    fn app_resumed_invalidates_listed_tasks() {
        let title = unique_token("ffi-resume");
        add_task(title.clone()).task_id.expect("id");

        assert!(app_resumed().ok);
        let task = find_task(&title, "CURRENT").expect("task should be listed");
        assert!(task.invalidated);
    }

    #[test]
    fn defer_task_rejects_unknown_preset() {
        assert!(!defer_task(0, "never".to_string(), 0).ok);
        assert!(!defer_task(0, "tomorrow".to_string(), i32::MAX).ok);
    }

    #[test]
    fn cancel_defer_and_resume_are_accepted() {
        let _guard = defer_guard();
        assert!(cancel_defer().ok);
        assert!(app_resumed().ok);
    }

    fn find_task(title: &str, column: &str) -> Option<TaskView> {
        list_tasks(Some(column.to_string()))
            .tasks
            .into_iter()
            .find(|task| task.title == title)
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
