//! Time utilities for labgate
//!
//! All governance decisions are made on local wall-clock time: class slots are
//! written as local weekday/time pairs, and the audit trail records local
//! timestamps.
//!
//! # Mock time
//!
//! Debug builds read `LABGATE_MOCK_TIME` (`YYYY-MM-DD HH:MM:SS`) once at first
//! use. When set, [`now`] is shifted by the difference between that instant
//! and the real clock, so the mocked clock keeps ticking from there. Release
//! builds ignore the variable.
//!
//! ```bash
//! LABGATE_MOCK_TIME="2025-12-29 08:30:00" labgate status
//! ```

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Debug-only clock override
pub const MOCK_TIME_ENV_VAR: &str = "LABGATE_MOCK_TIME";

const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format used in log lines and operator output
pub const LOG_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

static CLOCK_SHIFT: OnceLock<Option<TimeDelta>> = OnceLock::new();

fn clock_shift() -> Option<TimeDelta> {
    *CLOCK_SHIFT.get_or_init(|| {
        if !cfg!(debug_assertions) {
            return None;
        }
        let raw = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
        let shift = read_mock_time(&raw).map(|mocked| mocked - Local::now());

        match shift {
            Some(shift) => tracing::info!(
                mock_time = %raw,
                shift_secs = shift.num_seconds(),
                "Using mock clock"
            ),
            None => tracing::warn!(
                mock_time = %raw,
                expected = MOCK_TIME_FORMAT,
                "Ignoring unreadable mock time"
            ),
        }
        shift
    })
}

fn read_mock_time(raw: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), MOCK_TIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).single()
}

/// True when [`now`] is running on a mocked clock
pub fn is_mock_time_active() -> bool {
    clock_shift().is_some()
}

/// Current local time. Every governance decision reads the clock through here.
pub fn now() -> DateTime<Local> {
    let real = Local::now();
    clock_shift().map_or(real, |shift| real + shift)
}

/// Format a timestamp the way audit lines and reports print it.
pub fn format_log_timestamp(dt: &DateTime<Local>) -> String {
    dt.format(LOG_TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp written by [`format_log_timestamp`].
///
/// Returns `None` for malformed text and for local times that do not exist
/// (skipped by a DST transition).
pub fn parse_log_timestamp(s: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), LOG_TIMESTAMP_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Wall-clock time of day at minute resolution, as written in class slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WallClock {
    minutes: u16,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self {
            minutes: u16::from(hour) * 60 + u16::from(minute),
        })
    }

    /// Parse `HH:MM` (a single-digit hour is accepted)
    pub fn parse(s: &str) -> Result<Self, String> {
        let Some((h, m)) = s.trim().split_once(':') else {
            return Err(format!("expected HH:MM, got '{}'", s.trim()));
        };

        let hour: u8 = h
            .parse()
            .map_err(|_| format!("'{}' is not an hour", h))?;
        let minute: u8 = m
            .parse()
            .map_err(|_| format!("'{}' is not a minute", m))?;

        Self::new(hour, minute).ok_or_else(|| format!("{}:{} is out of range", h, m))
    }

    pub fn hour(&self) -> u8 {
        (self.minutes / 60) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.minutes % 60) as u8
    }

    fn seconds(&self) -> u32 {
        u32::from(self.minutes) * 60
    }

    /// True when `time` lies in `[self, end]`, both ends inclusive.
    ///
    /// `time` keeps its seconds, so an end of 09:00 admits 09:00:00 but not 09:00:01.
    pub fn spans(self, end: WallClock, time: NaiveTime) -> bool {
        (self.seconds()..=end.seconds()).contains(&time.num_seconds_from_midnight())
    }
}

impl std::fmt::Display for WallClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Parse a weekday name: "mon".."sun" or the full English name, any case.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Compact duration for logs and operator output, e.g. "35m 0s"
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, secs % 3600 / 60, secs % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m {}s", m, s),
        (h, m, s) => format!("{}h {}m {}s", h, m, s),
    }
}
