//! Weekly on-window schedule.
//!
//! A pure function of wall-clock time: the display should default to
//! powered-on inside these windows.  Clock transitions have no natural
//! event source, so a [`ScheduleWatcher`] is polled and turns the level
//! into edge-triggered `ScheduleChanged` events.
//!
//! ```text
//!   Mon–Fri   06:00 ──── 08:00          17:00 ──────── 23:00
//!   Sat–Sun         08:00 ───────────────────────────── 23:00
//! ```

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};

use crate::config::ScheduleConfig;
use crate::error::ConfigError;

// ═══════════════════════════════════════════════════════════════
//  Windows
// ═══════════════════════════════════════════════════════════════

/// Half-open time-of-day range `[start, end)`.
///
/// `start >= end` means the window wraps midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ScheduleWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Check if the given time of day falls inside the window.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start < self.end {
            // e.g., 06:00..08:00
            t >= self.start && t < self.end
        } else {
            // e.g., 22:00..06:00 (wraps around midnight)
            t >= self.start || t < self.end
        }
    }
}

/// Parse a strict `HH:MM` string.
///
/// `field` names the config key for the error message.
pub fn parse_time_of_day(field: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    let invalid = || ConfigError::InvalidTime {
        field,
        value: value.to_string(),
    };
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 5
        && bytes[2] == b':'
        && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
    if !shape_ok {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| invalid())
}

// ═══════════════════════════════════════════════════════════════
//  Weekly schedule
// ═══════════════════════════════════════════════════════════════

/// Two weekday windows (morning, evening) and one weekend window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub weekday_morning: ScheduleWindow,
    pub weekday_evening: ScheduleWindow,
    pub weekend: ScheduleWindow,
}

impl WeeklySchedule {
    /// Build from the configured `HH:MM` strings.  Any malformed string is
    /// a fatal [`ConfigError::InvalidTime`]; there is no default fallback.
    pub fn from_config(cfg: &ScheduleConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            weekday_morning: ScheduleWindow::new(
                parse_time_of_day("weekday_morning_start", &cfg.weekday_morning_start)?,
                parse_time_of_day("weekday_morning_end", &cfg.weekday_morning_end)?,
            ),
            weekday_evening: ScheduleWindow::new(
                parse_time_of_day("weekday_evening_start", &cfg.weekday_evening_start)?,
                parse_time_of_day("weekday_evening_end", &cfg.weekday_evening_end)?,
            ),
            weekend: ScheduleWindow::new(
                parse_time_of_day("weekend_start", &cfg.weekend_start)?,
                parse_time_of_day("weekend_end", &cfg.weekend_end)?,
            ),
        })
    }

    /// Whether the display should be on at `now`.
    pub fn is_scheduled_on(&self, now: NaiveDateTime) -> bool {
        let t = now.time();
        match now.weekday() {
            Weekday::Sat | Weekday::Sun => self.weekend.contains(t),
            _ => self.weekday_morning.contains(t) || self.weekday_evening.contains(t),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Edge detection
// ═══════════════════════════════════════════════════════════════

/// Turns periodic schedule evaluations into transitions.
#[derive(Debug, Clone)]
pub struct ScheduleWatcher {
    schedule: WeeklySchedule,
    previous: bool,
}

impl ScheduleWatcher {
    /// `initial` is the state the coordinator already acted on at startup,
    /// so the first poll does not repeat it.
    pub fn new(schedule: WeeklySchedule, initial: bool) -> Self {
        Self {
            schedule,
            previous: initial,
        }
    }

    /// Re-evaluate at `now`.  Returns the new value while it differs from
    /// the last committed one.
    pub fn pending(&self, now: NaiveDateTime) -> Option<bool> {
        let current = self.schedule.is_scheduled_on(now);
        (current != self.previous).then_some(current)
    }

    /// Record that the transition to `on` was delivered.  Until then
    /// [`pending`](Self::pending) keeps offering it.
    pub fn commit(&mut self, on: bool) {
        self.previous = on;
    }
}
