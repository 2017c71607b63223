//! Host adapter trait interfaces for labgate
//!
//! This crate defines the interface between the session monitor and the
//! platform that runs the external session process. It contains no platform
//! code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
