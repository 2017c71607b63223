//! Configuration validation

use crate::policy::{
    MAX_GRACE_SECONDS, MAX_POLL_INTERVAL_MS, MAX_SESSION_MINUTES, MAX_WINDOW_MINUTES,
};
use crate::schema::{RawConfig, RawSlot};
use labgate_util::{parse_weekday, WallClock};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Schedule slot #{index}: {message}")]
    SlotError { index: usize, message: String },

    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Unknown weekday '{0}'")]
    InvalidDay(String),

    #[error("Schedule slot #{index} ends ({end}) before it starts ({start})")]
    SlotEndsBeforeStart {
        index: usize,
        start: String,
        end: String,
    },

    #[error("Schedule has no slots")]
    EmptySchedule,

    #[error("{field} = {value} is above the limit of {max}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Session config error: {0}")]
    SessionError(String),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration, collecting every error
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.schedule.is_empty() {
        errors.push(ValidationError::EmptySchedule);
    }

    for (index, slot) in config.schedule.iter().enumerate() {
        errors.extend(validate_slot(index, slot));
    }

    let session = &config.session;
    if session.command.first().is_none_or(|c| c.trim().is_empty()) {
        errors.push(ValidationError::SessionError(
            "command cannot be empty".into(),
        ));
    }
    if session.duration_minutes == Some(0) {
        errors.push(ValidationError::SessionError(
            "duration_minutes must be greater than 0".into(),
        ));
    }
    if session.poll_interval_ms == Some(0) {
        errors.push(ValidationError::SessionError(
            "poll_interval_ms must be greater than 0".into(),
        ));
    }

    let limits = [
        ("session.duration_minutes", session.duration_minutes, MAX_SESSION_MINUTES),
        ("session.grace_seconds", session.grace_seconds, MAX_GRACE_SECONDS),
        ("session.poll_interval_ms", session.poll_interval_ms, MAX_POLL_INTERVAL_MS),
        ("audit.reaudit_after_minutes", config.audit.reaudit_after_minutes, MAX_WINDOW_MINUTES),
        ("violations.window_minutes", config.violations.window_minutes, MAX_WINDOW_MINUTES),
    ];
    for (field, value, max) in limits {
        if let Some(value) = value
            && value > max
        {
            errors.push(ValidationError::OutOfRange { field, value, max });
        }
    }

    if config.violations.window_minutes == Some(0) {
        errors.push(ValidationError::GlobalError(
            "violations.window_minutes must be greater than 0".into(),
        ));
    }
    if config.violations.max_distinct_identities == Some(0) {
        errors.push(ValidationError::GlobalError(
            "violations.max_distinct_identities must be at least 1".into(),
        ));
    }

    for (hostname, alias) in &config.machines {
        if alias.trim().is_empty() {
            errors.push(ValidationError::GlobalError(format!(
                "machine alias for '{}' is empty",
                hostname
            )));
        }
    }

    errors
}

fn validate_slot(index: usize, slot: &RawSlot) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if parse_weekday(&slot.day).is_none() {
        errors.push(ValidationError::InvalidDay(slot.day.clone()));
    }

    let start = WallClock::parse(&slot.start);
    if let Err(e) = &start {
        errors.push(ValidationError::InvalidTimeFormat {
            value: slot.start.clone(),
            message: e.clone(),
        });
    }

    let end = WallClock::parse(&slot.end);
    if let Err(e) = &end {
        errors.push(ValidationError::InvalidTimeFormat {
            value: slot.end.clone(),
            message: e.clone(),
        });
    }

    if let (Ok(start), Ok(end)) = (start, end)
        && start > end
    {
        errors.push(ValidationError::SlotEndsBeforeStart {
            index,
            start: slot.start.clone(),
            end: slot.end.clone(),
        });
    }

    if slot.school.trim().is_empty() {
        errors.push(ValidationError::SlotError {
            index,
            message: "school cannot be empty".into(),
        });
    }

    errors
}
