//! Validated policy structures

use crate::schema::{
    RawAuditConfig, RawConfig, RawServiceConfig, RawSessionConfig, RawSlot, RawViolationConfig,
};
use chrono::{DateTime, Datelike, Local, Weekday};
use labgate_util::{default_data_dir, parse_weekday, MachineId, WallClock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default session budget
pub const DEFAULT_SESSION_MINUTES: u64 = 35;
/// Default pause between the timeout warning and forced termination
pub const DEFAULT_GRACE_SECONDS: u64 = 5;
/// Default liveness polling interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
/// Default interval after which a returning identity is audited again
pub const DEFAULT_REAUDIT_MINUTES: u64 = 120;
/// Default trailing window for violation detection
pub const DEFAULT_VIOLATION_WINDOW_MINUTES: u64 = 60;
/// Default maximum number of distinct identities per machine per window
pub const DEFAULT_MAX_DISTINCT_IDENTITIES: usize = 2;

/// Longest session budget accepted from config (one day)
pub const MAX_SESSION_MINUTES: u64 = 24 * 60;
/// Longest timeout grace period accepted from config
pub const MAX_GRACE_SECONDS: u64 = 3600;
/// Slowest liveness polling accepted from config
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;
/// Longest re-audit interval or violation window accepted from config (one week)
pub const MAX_WINDOW_MINUTES: u64 = 7 * 24 * 60;

/// Validated policy ready for use by the core
#[derive(Debug, Clone)]
pub struct Policy {
    pub service: ServiceConfig,

    /// Class slots in declaration order
    pub schedule: Vec<ScheduleSlot>,

    pub session: SessionPolicy,
    pub audit: AuditPolicy,
    pub violations: ViolationPolicy,
    pub machines: MachineAliases,
}

impl Policy {
    /// Convert from raw config. Only valid after [`validate_config`] reported
    /// no errors; slots it would reject are not representable here.
    ///
    /// [`validate_config`]: crate::validate_config
    pub(crate) fn from_raw(raw: RawConfig) -> Self {
        let schedule = raw
            .schedule
            .into_iter()
            .filter_map(ScheduleSlot::from_raw)
            .collect();

        Self {
            service: ServiceConfig::from_raw(raw.service),
            schedule,
            session: SessionPolicy::from_raw(raw.session),
            audit: AuditPolicy::from_raw(raw.audit),
            violations: ViolationPolicy::from_raw(raw.violations),
            machines: MachineAliases::new(raw.machines),
        }
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}

/// Service paths
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub roster_path: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            roster_path: raw
                .roster_path
                .unwrap_or_else(|| PathBuf::from("roster.json")),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

/// A weekday/time interval during which one class may use the lab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub weekday: Weekday,
    pub start: WallClock,
    /// Inclusive
    pub end: WallClock,
    pub school: String,
    pub grade: String,
    pub group: String,
}

impl ScheduleSlot {
    fn from_raw(raw: RawSlot) -> Option<Self> {
        Some(Self {
            weekday: parse_weekday(&raw.day)?,
            start: WallClock::parse(&raw.start).ok()?,
            end: WallClock::parse(&raw.end).ok()?,
            school: raw.school.trim().to_string(),
            grade: raw.grade.trim().to_string(),
            group: raw.group.trim().to_string(),
        })
    }

    /// Check whether the given local time falls on this slot (both ends inclusive)
    pub fn contains(&self, dt: &DateTime<Local>) -> bool {
        dt.weekday() == self.weekday && self.start.spans(self.end, dt.time())
    }

    /// "<grade> - <group> - <school>"
    pub fn class_label(&self) -> String {
        format!("{} - {} - {}", self.grade, self.group, self.school)
    }
}

impl std::fmt::Display for ScheduleSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}-{} ({})",
            self.weekday,
            self.start,
            self.end,
            self.class_label()
        )
    }
}

/// Session lifetime policy
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub command: Vec<String>,
    pub duration: Duration,
    pub grace: Duration,
    pub poll_interval: Duration,
    pub warning_title: String,
    pub warning_message: String,
}

impl SessionPolicy {
    fn from_raw(raw: RawSessionConfig) -> Self {
        Self {
            command: raw.command,
            duration: minutes(raw.duration_minutes.unwrap_or(DEFAULT_SESSION_MINUTES)),
            grace: Duration::from_secs(raw.grace_seconds.unwrap_or(DEFAULT_GRACE_SECONDS)),
            poll_interval: Duration::from_millis(
                raw.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            warning_title: raw.warning_title.unwrap_or_else(|| "Time's up".into()),
            warning_message: raw.warning_message.unwrap_or_else(|| {
                "Your time is over. Now it's your classmate's turn.".into()
            }),
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from_raw(RawSessionConfig::default())
    }
}

/// Compact trail policy
#[derive(Debug, Clone)]
pub struct AuditPolicy {
    pub reaudit_after: Duration,
}

impl AuditPolicy {
    fn from_raw(raw: RawAuditConfig) -> Self {
        Self {
            reaudit_after: minutes(raw.reaudit_after_minutes.unwrap_or(DEFAULT_REAUDIT_MINUTES)),
        }
    }
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self::from_raw(RawAuditConfig::default())
    }
}

/// Account-sharing detection policy
#[derive(Debug, Clone)]
pub struct ViolationPolicy {
    pub window: Duration,
    pub max_distinct_identities: usize,
}

impl ViolationPolicy {
    fn from_raw(raw: RawViolationConfig) -> Self {
        Self {
            window: minutes(raw.window_minutes.unwrap_or(DEFAULT_VIOLATION_WINDOW_MINUTES)),
            max_distinct_identities: raw
                .max_distinct_identities
                .unwrap_or(DEFAULT_MAX_DISTINCT_IDENTITIES),
        }
    }
}

impl Default for ViolationPolicy {
    fn default() -> Self {
        Self::from_raw(RawViolationConfig::default())
    }
}

/// Hostname -> display alias lookup
#[derive(Debug, Clone, Default)]
pub struct MachineAliases {
    aliases: HashMap<String, String>,
}

impl MachineAliases {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Alias for `hostname`, or the hostname itself when none is configured
    pub fn resolve(&self, hostname: &str) -> MachineId {
        match self.aliases.get(hostname) {
            Some(alias) => MachineId::new(alias.trim()),
            None => MachineId::new(hostname),
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
