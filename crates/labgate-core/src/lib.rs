//! Access governance engine for labgate
//!
//! This crate is the heart of labgate, containing:
//! - Schedule resolution and roster gating (who may log in right now)
//! - Compact audit trail decisions and the per-login write path
//! - Session supervision (Idle -> Active -> TimedOut | ExternallyClosed)
//! - Retrospective account-sharing detection and usage summaries

mod access;
mod compactor;
mod gate;
mod monitor;
mod report;
mod schedule;
mod violations;

pub use access::*;
pub use compactor::*;
pub use gate::*;
pub use monitor::*;
pub use report::*;
pub use schedule::*;
pub use violations::*;
