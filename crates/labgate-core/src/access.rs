//! Per-login audit write path

use labgate_store::{AccessEvent, AccessLog};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{AccessCompactor, CompactDecision};

/// What the recorder managed to write for one login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessReport {
    /// A new compact trail line was written
    pub compact_appended: bool,
    /// The raw history row was written
    pub event_appended: bool,
}

/// Writes the compact trail line (when significant) and the raw event.
///
/// Store failures are logged and reported, never returned: a failed audit
/// write does not cancel the login.
pub struct AccessRecorder {
    store: Arc<dyn AccessLog>,
    compactor: AccessCompactor,
}

impl AccessRecorder {
    pub fn new(store: Arc<dyn AccessLog>, compactor: AccessCompactor) -> Self {
        Self { store, compactor }
    }

    pub fn record(&self, event: &AccessEvent) -> AccessReport {
        let mut report = AccessReport::default();

        let prior = match self.store.latest_compact_line(&event.machine_id) {
            Ok(prior) => prior,
            Err(e) => {
                warn!(machine = %event.machine_id, error = %e, "Failed to read trail, treating machine as unrecorded");
                None
            }
        };

        match self.compactor.compact(prior.as_deref(), event) {
            CompactDecision::Append(record) => {
                match self.store.append_compact_line(&record.machine_id, &record.to_line()) {
                    Ok(()) => report.compact_appended = true,
                    Err(e) => warn!(machine = %record.machine_id, error = %e, "Failed to append trail line"),
                }
            }
            CompactDecision::Suppress => {}
        }

        match self.store.append_event(event) {
            Ok(()) => report.event_appended = true,
            Err(e) => warn!(machine = %event.machine_id, error = %e, "Failed to append access event"),
        }

        info!(
            identity = %event.identity_name,
            machine = %event.machine_id,
            compact = report.compact_appended,
            raw = report.event_appended,
            "Access recorded"
        );
        report
    }
}
