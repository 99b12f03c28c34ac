//! Local notification capability for deferred tasks.
//!
//! # Responsibility
//! - Define the fixed "Deferred Task" payload shown when a deferral elapses.
//! - Define the scheduler seam the action layer calls into.
//!
//! # Invariants
//! - Notifications are keyed by the stringified task id; scheduling the same
//!   key twice replaces the earlier entry.
//! - Only title and fire instant vary between payloads.

use crate::db::DbError;
use crate::model::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod outbox;

pub use outbox::SqliteNotificationScheduler;

/// Fixed subtitle of every deferral notification.
pub const DEFERRED_SUB_TEXT: &str = "Deferred Task";
pub const SMALL_ICON: &str = "ic_notification";
pub const LARGE_ICON: &str = "ic_launcher";
pub const ACCENT_COLOR: &str = "#4a90e2";
pub const VIBRATION_MS: u32 = 300;

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug)]
pub enum NotificationError {
    Db(DbError),
    InvalidKey(String),
    InvalidData(String),
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey(key) => write!(f, "invalid notification key `{key}`"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted notification data: {message}")
            }
        }
    }
}

impl Error for NotificationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for NotificationError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for NotificationError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Visual constants shared by every deferral notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStyle {
    pub small_icon: String,
    pub large_icon: String,
    pub color: String,
    pub vibrate: bool,
    pub vibration_ms: u32,
}

impl Default for NotificationStyle {
    fn default() -> Self {
        Self {
            small_icon: SMALL_ICON.to_string(),
            large_icon: LARGE_ICON.to_string(),
            color: ACCENT_COLOR.to_string(),
            vibrate: true,
            vibration_ms: VIBRATION_MS,
        }
    }
}

/// Payload handed to the platform notification backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Ticker line; the task title.
    pub title: String,
    pub message: String,
    pub big_text: String,
    pub sub_text: String,
    pub fire_at: DateTime<Utc>,
    pub style: NotificationStyle,
}

impl Notification {
    /// Builds the fixed deferral payload for one task.
    pub fn deferred_task(title: &str, fire_at: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            message: title.to_string(),
            big_text: title.to_string(),
            sub_text: DEFERRED_SUB_TEXT.to_string(),
            fire_at,
            style: NotificationStyle::default(),
        }
    }
}

/// Scheduler key for a task's notification.
pub fn notification_key(id: TaskId) -> String {
    id.to_string()
}

/// External notification backend.
///
/// Callers treat both operations as fire-and-forget; errors are reported
/// for diagnostics only.
pub trait NotificationScheduler {
    fn schedule(&self, key: &str, notification: &Notification) -> NotificationResult<()>;
    fn cancel(&self, key: &str) -> NotificationResult<()>;
}

impl<S: NotificationScheduler + ?Sized> NotificationScheduler for &S {
    fn schedule(&self, key: &str, notification: &Notification) -> NotificationResult<()> {
        (**self).schedule(key, notification)
    }

    fn cancel(&self, key: &str) -> NotificationResult<()> {
        (**self).cancel(key)
    }
}

#[cfg(test)]
mod tests {
    use super::{notification_key, Notification, DEFERRED_SUB_TEXT};
    use chrono::{TimeZone, Utc};

    #[test]
    fn deferred_task_payload_uses_title_everywhere() {
        let fire_at = Utc.with_ymd_and_hms(2015, 10, 21, 17, 29, 0).unwrap();
        let notification = Notification::deferred_task("Buy milk", fire_at);

        assert_eq!(notification.title, "Buy milk");
        assert_eq!(notification.message, "Buy milk");
        assert_eq!(notification.big_text, "Buy milk");
        assert_eq!(notification.sub_text, DEFERRED_SUB_TEXT);
        assert_eq!(notification.fire_at, fire_at);
        assert!(notification.style.vibrate);
    }

    #[test]
    fn key_is_stringified_task_id() {
        assert_eq!(notification_key(42), "42");
    }
}
