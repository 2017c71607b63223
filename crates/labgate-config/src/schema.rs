//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Paths and service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Supervised session settings
    #[serde(default)]
    pub session: RawSessionConfig,

    /// Compact audit trail settings
    #[serde(default)]
    pub audit: RawAuditConfig,

    /// Account-sharing detection settings
    #[serde(default)]
    pub violations: RawViolationConfig,

    /// Class slots, evaluated in declaration order
    #[serde(default)]
    pub schedule: Vec<RawSlot>,

    /// Hostname -> display alias
    #[serde(default)]
    pub machines: HashMap<String, String>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Roster file (JSON). Relative paths resolve against the config file's directory.
    pub roster_path: Option<PathBuf>,
}

/// Session lifetime settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSessionConfig {
    /// Command line of the external session process
    #[serde(default)]
    pub command: Vec<String>,

    /// Wall-clock budget per session
    pub duration_minutes: Option<u64>,

    /// Pause between the timeout warning and forced termination
    pub grace_seconds: Option<u64>,

    /// Liveness polling interval
    pub poll_interval_ms: Option<u64>,

    pub warning_title: Option<String>,
    pub warning_message: Option<String>,
}

/// Compact trail settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAuditConfig {
    /// Same identity on the same machine is recorded again after this long
    pub reaudit_after_minutes: Option<u64>,
}

/// Violation detection settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawViolationConfig {
    /// Trailing window length
    pub window_minutes: Option<u64>,

    /// A machine may see at most this many distinct identities per window
    pub max_distinct_identities: Option<usize>,
}

/// One class slot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSlot {
    /// Weekday: "mon".."sun" or full name
    pub day: String,

    /// Start time (HH:MM format)
    pub start: String,

    /// End time (HH:MM format), inclusive
    pub end: String,

    pub school: String,
    pub grade: String,
    pub group: String,
}

/// One roster record (JSON)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRosterRecord {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub school: String,

    /// "<grade> - <group>", or just "<grade>"
    #[serde(default)]
    pub class: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_schedule_slots() {
        let toml_str = r#"
            config_version = 1

            [[schedule]]
            day = "mon"
            start = "08:00"
            end = "09:00"
            school = "Central"
            grade = "5th grade"
            group = "A"

            [[schedule]]
            day = "Tuesday"
            start = "13:30"
            end = "14:15"
            school = "Central"
            grade = "6th grade"
            group = "B"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.schedule.len(), 2);
        assert_eq!(config.schedule[1].day, "Tuesday");
        assert!(config.machines.is_empty());
    }

    #[test]
    fn parse_sections_and_machines() {
        let toml_str = r#"
            config_version = 1

            [session]
            command = ["firefox", "--kiosk", "https://example.org"]
            duration_minutes = 35

            [violations]
            window_minutes = 30
            max_distinct_identities = 3

            [machines]
            "lab-pc-01" = "PC 01"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.session.command.len(), 3);
        assert_eq!(config.session.duration_minutes, Some(35));
        assert_eq!(config.violations.max_distinct_identities, Some(3));
        assert_eq!(config.machines.get("lab-pc-01").map(String::as_str), Some("PC 01"));
    }

    #[test]
    fn parse_roster_record_without_class() {
        let json = r#"{"full_name": "Ana", "email": "ana@example.org", "password": "x", "school": "Central"}"#;
        let record: RawRosterRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.class, "");
    }
}
