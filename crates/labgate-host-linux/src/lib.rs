//! Linux host adapter for labgate
//!
//! Provides:
//! - Session process spawning with process group isolation
//! - Liveness polling and graceful (SIGTERM) / forceful (SIGKILL) termination
//! - Desktop notifications through `notify-send`
//! - Machine hostname lookup

mod adapter;
mod process;

pub use adapter::*;
pub use process::*;
