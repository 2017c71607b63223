//! Configuration and roster loading for labgate
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Ordered class schedule
//! - Session, audit and violation tunables
//! - Machine aliases
//! - Validation with clear error messages
//!
//! The roster is a separate JSON file referenced from the config.

mod policy;
mod roster;
mod schema;
mod validation;

pub use policy::*;
pub use roster::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),

    #[error("Failed to parse roster: {0}")]
    RosterParseError(#[from] serde_json::Error),

    #[error("Roster is empty")]
    EmptyRoster,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file.
///
/// A relative `roster_path` is resolved against the config file's directory.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let mut policy = parse_config(&content)?;

    if policy.service.roster_path.is_relative()
        && let Some(dir) = path.parent()
    {
        policy.service.roster_path = dir.join(&policy.service.roster_path);
    }

    debug!(
        path = %path.display(),
        slots = policy.schedule.len(),
        "Config loaded"
    );
    Ok(policy)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Policy> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Policy::from_raw(raw))
}

/// Load a roster from a JSON file
pub fn load_roster(path: impl AsRef<Path>) -> ConfigResult<Roster> {
    let content = std::fs::read_to_string(path)?;
    parse_roster(&content)
}

/// Parse a roster from JSON. An empty roster is an error.
pub fn parse_roster(content: &str) -> ConfigResult<Roster> {
    let records: Vec<RawRosterRecord> = serde_json::from_str(content)?;
    if records.is_empty() {
        return Err(ConfigError::EmptyRoster);
    }

    let roster = Roster::new(records.into_iter().map(Identity::from_raw).collect());
    debug!(identities = roster.len(), "Roster loaded");
    Ok(roster)
}
