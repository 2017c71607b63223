//! Access event and compact trail record types

use chrono::{DateTime, Local};
use labgate_util::{format_log_timestamp, parse_log_timestamp, MachineId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One accepted login, as written to the raw history
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessEvent {
    pub timestamp: DateTime<Local>,
    pub identity_name: String,
    pub identity_email: String,
    pub school: String,
    pub machine_id: MachineId,
}

impl AccessEvent {
    pub fn new(
        timestamp: DateTime<Local>,
        identity_name: impl Into<String>,
        identity_email: impl Into<String>,
        school: impl Into<String>,
        machine_id: MachineId,
    ) -> Self {
        Self {
            timestamp,
            identity_name: identity_name.into(),
            identity_email: identity_email.into(),
            school: school.into(),
            machine_id,
        }
    }
}

/// Occupancy record in the compact trail.
///
/// Stored as a text line: `<identity> accessed <machine> - <dd/mm/YYYY HH:MM:SS>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactRecord {
    pub identity_name: String,
    pub machine_id: MachineId,
    pub timestamp: DateTime<Local>,
}

/// Why a trail line could not be read back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrailParseError {
    #[error("missing timestamp separator")]
    MissingTimestamp,

    #[error("unreadable timestamp '{0}'")]
    BadTimestamp(String),

    #[error("line is not tagged with machine '{0}'")]
    MachineMismatch(String),

    #[error("missing identity name")]
    MissingIdentity,
}

const ACCESSED: &str = " accessed ";
const TIMESTAMP_SEPARATOR: &str = " - ";

impl CompactRecord {
    pub fn from_event(event: &AccessEvent) -> Self {
        Self {
            identity_name: event.identity_name.clone(),
            machine_id: event.machine_id.clone(),
            timestamp: event.timestamp,
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.identity_name,
            ACCESSED,
            self.machine_id,
            TIMESTAMP_SEPARATOR,
            format_log_timestamp(&self.timestamp)
        )
    }

    /// Parse a trail line written for `machine`.
    ///
    /// The timestamp is taken after the last separator and the identity is
    /// whatever precedes the machine tag, so names may contain either token.
    pub fn parse_line(line: &str, machine: &MachineId) -> Result<Self, TrailParseError> {
        let (head, ts) = line
            .trim_end()
            .rsplit_once(TIMESTAMP_SEPARATOR)
            .ok_or(TrailParseError::MissingTimestamp)?;

        let timestamp =
            parse_log_timestamp(ts).ok_or_else(|| TrailParseError::BadTimestamp(ts.to_string()))?;

        let tag = format!("{}{}", ACCESSED, machine);
        let identity_name = head
            .strip_suffix(&tag)
            .ok_or_else(|| TrailParseError::MachineMismatch(machine.to_string()))?;

        if identity_name.trim().is_empty() {
            return Err(TrailParseError::MissingIdentity);
        }

        Ok(Self {
            identity_name: identity_name.to_string(),
            machine_id: machine.clone(),
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> CompactRecord {
        CompactRecord {
            identity_name: "Ana Souza".into(),
            machine_id: MachineId::new("PC 01"),
            timestamp: Local.with_ymd_and_hms(2025, 12, 29, 8, 31, 0).unwrap(),
        }
    }

    #[test]
    fn line_format() {
        assert_eq!(record().to_line(), "Ana Souza accessed PC 01 - 29/12/2025 08:31:00");
    }

    #[test]
    fn parse_written_line() {
        let line = record().to_line();
        let parsed = CompactRecord::parse_line(&line, &MachineId::new("PC 01")).unwrap();
        assert_eq!(parsed, record());
    }

    #[test]
    fn parse_name_containing_separators() {
        let mut rec = record();
        rec.identity_name = "Ana - accessed Souza".into();
        let parsed = CompactRecord::parse_line(&rec.to_line(), &rec.machine_id).unwrap();
        assert_eq!(parsed.identity_name, "Ana - accessed Souza");
    }

    #[test]
    fn parse_rejects_corrupt_lines() {
        let machine = MachineId::new("PC 01");

        assert_eq!(
            CompactRecord::parse_line("garbage", &machine),
            Err(TrailParseError::MissingTimestamp)
        );
        assert!(matches!(
            CompactRecord::parse_line("Ana accessed PC 01 - yesterday", &machine),
            Err(TrailParseError::BadTimestamp(_))
        ));
        assert!(matches!(
            CompactRecord::parse_line("Ana accessed PC 02 - 29/12/2025 08:31:00", &machine),
            Err(TrailParseError::MachineMismatch(_))
        ));
        assert_eq!(
            CompactRecord::parse_line(" accessed PC 01 - 29/12/2025 08:31:00", &machine),
            Err(TrailParseError::MissingIdentity)
        );
    }
}
