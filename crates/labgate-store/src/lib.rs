//! Persistence layer for labgate
//!
//! Provides:
//! - Raw access history (append-only)
//! - Compact occupancy trail (append-only text lines, keyed lookup by machine)

mod events;
mod sqlite;
mod traits;

pub use events::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
