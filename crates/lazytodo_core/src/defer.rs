//! Deferral target resolution.
//!
//! # Responsibility
//! - Turn user-facing defer choices ("tomorrow", "next week") into the
//!   concrete instant a deferral resolves to.
//!
//! # Invariants
//! - Resolved instants are strictly later than `now`, except `Until`, which
//!   is returned as given.
//! - Wall-clock hours are interpreted in the caller's UTC offset.

use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DEFAULT_MORNING_HOUR: u32 = 9;
const DEFAULT_EVENING_HOUR: u32 = 18;
const DEFAULT_LATER_HOURS: i64 = 3;

/// A user's defer choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferPreset {
    LaterToday,
    ThisEvening,
    Tomorrow,
    ThisWeekend,
    NextWeek,
    /// Explicit instant picked by the user.
    Until(DateTime<Utc>),
    /// Deferred with no target; no notification is scheduled.
    Someday,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDeferPresetError(pub String);

impl Display for ParseDeferPresetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown defer preset `{}`; expected later_today|this_evening|tomorrow|this_weekend|next_week|someday",
            self.0
        )
    }
}

impl Error for ParseDeferPresetError {}

impl FromStr for DeferPreset {
    type Err = ParseDeferPresetError;

    /// Parses the named presets. `Until` has no label and is never produced.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "later_today" => Ok(Self::LaterToday),
            "this_evening" => Ok(Self::ThisEvening),
            "tomorrow" => Ok(Self::Tomorrow),
            "this_weekend" => Ok(Self::ThisWeekend),
            "next_week" => Ok(Self::NextWeek),
            "someday" => Ok(Self::Someday),
            _ => Err(ParseDeferPresetError(value.to_string())),
        }
    }
}

/// Wall-clock anchors used to resolve presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferSchedule {
    /// Hour (0-23) that "tomorrow", "weekend" and "next week" land on.
    pub morning_hour: u32,
    /// Hour (0-23) that "this evening" lands on.
    pub evening_hour: u32,
    /// Offset added for "later today".
    pub later_offset: Duration,
}

impl Default for DeferSchedule {
    fn default() -> Self {
        Self {
            morning_hour: DEFAULT_MORNING_HOUR,
            evening_hour: DEFAULT_EVENING_HOUR,
            later_offset: Duration::hours(DEFAULT_LATER_HOURS),
        }
    }
}

impl DeferSchedule {
    /// Resolves `preset` relative to `now`.
    ///
    /// Returns `None` for `Someday`, and for hours outside `0..24`.
    pub fn resolve(&self, preset: DeferPreset, now: DateTime<FixedOffset>) -> Option<DateTime<Utc>> {
        let resolved = match preset {
            DeferPreset::LaterToday => now + self.later_offset,
            DeferPreset::ThisEvening => {
                let today = at_hour(now, 0, self.evening_hour)?;
                if today > now {
                    today
                } else {
                    at_hour(now, 1, self.evening_hour)?
                }
            }
            DeferPreset::Tomorrow => at_hour(now, 1, self.morning_hour)?,
            DeferPreset::ThisWeekend => {
                // Monday = 0 .. Saturday = 5, Sunday = 6.
                let weekday = now.weekday().num_days_from_monday();
                let days = (5 + 7 - weekday) % 7;
                let saturday = at_hour(now, u64::from(days), self.morning_hour)?;
                if saturday > now {
                    saturday
                } else {
                    at_hour(now, 7, self.morning_hour)?
                }
            }
            DeferPreset::NextWeek => {
                let weekday = now.weekday().num_days_from_monday();
                at_hour(now, u64::from(7 - weekday), self.morning_hour)?
            }
            DeferPreset::Until(until) => return Some(until),
            DeferPreset::Someday => return None,
        };
        Some(resolved.with_timezone(&Utc))
    }
}

fn at_hour(now: DateTime<FixedOffset>, days_ahead: u64, hour: u32) -> Option<DateTime<FixedOffset>> {
    let date = now.date_naive().checked_add_days(Days::new(days_ahead))?;
    let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
    now.offset()
        .from_local_datetime(&date.and_time(time))
        .single()
}
