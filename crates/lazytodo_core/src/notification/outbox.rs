//! SQLite-backed notification outbox.
//!
//! # Responsibility
//! - Persist scheduled deferral notifications until the host delivers them.
//! - Let the host poll due entries and acknowledge delivery.
//!
//! # Invariants
//! - One row per key; re-scheduling a key replaces its payload and time.
//! - `fire_at` is stored as Unix epoch milliseconds.

use super::{
    Notification, NotificationError, NotificationResult, NotificationScheduler, NotificationStyle,
};
use crate::db::migrations::latest_version;
use crate::db::DbError;
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{params, Connection, Row};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    key,
    title,
    message,
    big_text,
    sub_text,
    small_icon,
    large_icon,
    color,
    vibrate,
    vibration_ms,
    fire_at
FROM scheduled_notifications";

/// A persisted notification with its scheduler key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub key: String,
    pub notification: Notification,
}

/// Notification scheduler writing into the `scheduled_notifications` table.
pub struct SqliteNotificationScheduler<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationScheduler<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - `Db(UnsupportedSchemaVersion)` when migrations were not applied to
    ///   the latest version this binary knows.
    pub fn try_new(conn: &'conn Connection) -> NotificationResult<Self> {
        let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if version != latest_version() {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: version,
                latest_supported: latest_version(),
            }
            .into());
        }
        Ok(Self { conn })
    }

    /// Lists notifications whose fire time is at or before `now`, oldest first.
    pub fn due(&self, now: DateTime<Utc>) -> NotificationResult<Vec<ScheduledNotification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL} WHERE fire_at <= ?1 ORDER BY fire_at ASC, key ASC"
        ))?;
        let rows = stmt.query_map([now.timestamp_millis()], read_row)?;
        collect_scheduled(rows)
    }

    /// Lists every pending notification, oldest first.
    pub fn pending(&self) -> NotificationResult<Vec<ScheduledNotification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL} ORDER BY fire_at ASC, key ASC"
        ))?;
        let rows = stmt.query_map([], read_row)?;
        collect_scheduled(rows)
    }

    /// Removes a delivered notification. Returns whether a row existed.
    pub fn acknowledge(&self, key: &str) -> NotificationResult<bool> {
        let key = validate_key(key)?;
        let removed = self.conn.execute(
            "DELETE FROM scheduled_notifications WHERE key = ?1",
            [key],
        )?;
        info!(
            "event=notification_ack module=notification status=ok removed={}",
            removed
        );
        Ok(removed > 0)
    }
}

impl NotificationScheduler for SqliteNotificationScheduler<'_> {
    fn schedule(&self, key: &str, notification: &Notification) -> NotificationResult<()> {
        let key = validate_key(key)?;
        let style = &notification.style;
        self.conn.execute(
            "INSERT INTO scheduled_notifications (
                key,
                title,
                message,
                big_text,
                sub_text,
                small_icon,
                large_icon,
                color,
                vibrate,
                vibration_ms,
                fire_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(key) DO UPDATE SET
                title = excluded.title,
                message = excluded.message,
                big_text = excluded.big_text,
                sub_text = excluded.sub_text,
                small_icon = excluded.small_icon,
                large_icon = excluded.large_icon,
                color = excluded.color,
                vibrate = excluded.vibrate,
                vibration_ms = excluded.vibration_ms,
                fire_at = excluded.fire_at",
            params![
                key,
                notification.title,
                notification.message,
                notification.big_text,
                notification.sub_text,
                style.small_icon,
                style.large_icon,
                style.color,
                style.vibrate,
                style.vibration_ms,
                notification.fire_at.timestamp_millis(),
            ],
        )?;
        debug!(
            "event=notification_schedule module=notification status=ok fire_at_ms={}",
            notification.fire_at.timestamp_millis()
        );
        Ok(())
    }

    fn cancel(&self, key: &str) -> NotificationResult<()> {
        let key = validate_key(key)?;
        let removed = self.conn.execute(
            "DELETE FROM scheduled_notifications WHERE key = ?1",
            [key],
        )?;
        debug!(
            "event=notification_cancel module=notification status=ok removed={}",
            removed
        );
        Ok(())
    }
}

fn collect_scheduled(
    rows: impl Iterator<Item = rusqlite::Result<RawNotification>>,
) -> NotificationResult<Vec<ScheduledNotification>> {
    let mut scheduled = Vec::new();
    for row in rows {
        scheduled.push(row?.into_scheduled()?);
    }
    Ok(scheduled)
}

fn validate_key(key: &str) -> NotificationResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(NotificationError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}

struct RawNotification {
    key: String,
    title: String,
    message: String,
    big_text: String,
    sub_text: String,
    small_icon: String,
    large_icon: String,
    color: String,
    vibrate: bool,
    vibration_ms: u32,
    fire_at_ms: i64,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawNotification> {
    Ok(RawNotification {
        key: row.get(0)?,
        title: row.get(1)?,
        message: row.get(2)?,
        big_text: row.get(3)?,
        sub_text: row.get(4)?,
        small_icon: row.get(5)?,
        large_icon: row.get(6)?,
        color: row.get(7)?,
        vibrate: row.get(8)?,
        vibration_ms: row.get(9)?,
        fire_at_ms: row.get(10)?,
    })
}

impl RawNotification {
    fn into_scheduled(self) -> NotificationResult<ScheduledNotification> {
        let fire_at = DateTime::<Utc>::from_timestamp_millis(self.fire_at_ms).ok_or_else(|| {
            NotificationError::InvalidData(format!(
                "fire_at out of range for key `{}`: {}",
                self.key, self.fire_at_ms
            ))
        })?;
        Ok(ScheduledNotification {
            key: self.key,
            notification: Notification {
                title: self.title,
                message: self.message,
                big_text: self.big_text,
                sub_text: self.sub_text,
                fire_at,
                style: NotificationStyle {
                    small_icon: self.small_icon,
                    large_icon: self.large_icon,
                    color: self.color,
                    vibrate: self.vibrate,
                    vibration_ms: self.vibration_ms,
                },
            },
        })
    }
}
