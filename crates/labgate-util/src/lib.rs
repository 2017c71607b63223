//! Shared utilities for labgate
//!
//! This crate provides:
//! - ID types (MachineId, SessionId)
//! - Wall-clock helpers (mock-able `now()`, slot times, weekday parsing)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
