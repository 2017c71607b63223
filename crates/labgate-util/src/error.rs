//! Error types for labgate

use thiserror::Error;

/// Errors raised while deciding whether a login may proceed
#[derive(Debug, Error)]
pub enum LabgateError {
    #[error("Roster is empty")]
    EmptyRoster,

    #[error("No class is scheduled at this time")]
    OutsideSchedule,

    #[error("Scheduled class ({grade} - {group} - {school}) not found in roster")]
    ClassNotInRoster {
        school: String,
        grade: String,
        group: String,
    },

    #[error("'{0}' is not permitted to log in right now")]
    IdentityNotPermitted(String),

    #[error("Session already started")]
    SessionAlreadyStarted,
}

pub type Result<T> = std::result::Result<T, LabgateError>;
