//! Retrospective account-sharing detection

use chrono::{DateTime, Local, TimeDelta};
use labgate_config::ViolationPolicy;
use labgate_store::AccessEvent;
use labgate_util::MachineId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;
use tracing::debug;

/// Too many distinct identities on one machine inside a trailing window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub machine_id: MachineId,
    pub window_start: DateTime<Local>,
    pub window_end: DateTime<Local>,
    pub distinct_identity_count: usize,
    /// Sorted names seen in the window
    pub identities: Vec<String>,
    pub triggering_event: AccessEvent,
}

impl Violation {
    /// e.g. "3 distinct identities within 60 minutes"
    pub fn reason(&self) -> String {
        format!(
            "{} distinct identities within {} minutes",
            self.distinct_identity_count,
            (self.window_end - self.window_start).num_minutes()
        )
    }
}

/// Scans raw history for machines shared by too many identities.
///
/// For every event the trailing window `[t - window, t]` on the same machine
/// is inspected; more than `max_distinct` names raises a violation at that
/// event.
#[derive(Debug, Clone)]
pub struct ViolationDetector {
    window: TimeDelta,
    max_distinct: usize,
}

impl ViolationDetector {
    pub fn new(window: Duration, max_distinct: usize) -> Self {
        Self {
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            max_distinct,
        }
    }

    pub fn from_policy(policy: &ViolationPolicy) -> Self {
        Self::new(policy.window, policy.max_distinct_identities)
    }

    /// Violations ordered by triggering timestamp, then machine
    pub fn detect(&self, history: &[AccessEvent]) -> Vec<Violation> {
        // Per-machine index, time ordered (stable, so ties keep history order)
        let mut by_machine: BTreeMap<&MachineId, Vec<&AccessEvent>> = BTreeMap::new();
        for event in history {
            by_machine.entry(&event.machine_id).or_default().push(event);
        }
        for events in by_machine.values_mut() {
            events.sort_by_key(|e| e.timestamp);
        }

        let mut seen = HashSet::new();
        let mut violations = Vec::new();

        for (machine, events) in &by_machine {
            for event in events {
                let window_end = event.timestamp;
                let window_start = window_end
                    .checked_sub_signed(self.window)
                    .unwrap_or(events[0].timestamp);

                let lo = events.partition_point(|e| e.timestamp < window_start);
                let hi = events.partition_point(|e| e.timestamp <= window_end);

                let names: BTreeSet<&str> = events[lo..hi]
                    .iter()
                    .map(|e| e.identity_name.as_str())
                    .collect();

                if names.len() <= self.max_distinct {
                    continue;
                }

                // Identical events yield identical tuples
                if !seen.insert((*machine, window_start, window_end, *event)) {
                    continue;
                }

                violations.push(Violation {
                    machine_id: (*machine).clone(),
                    window_start,
                    window_end,
                    distinct_identity_count: names.len(),
                    identities: names.into_iter().map(String::from).collect(),
                    triggering_event: (*event).clone(),
                });
            }
        }

        violations.sort_by(|a, b| {
            a.triggering_event
                .timestamp
                .cmp(&b.triggering_event.timestamp)
                .then_with(|| a.machine_id.cmp(&b.machine_id))
        });

        debug!(
            events = history.len(),
            machines = by_machine.len(),
            violations = violations.len(),
            "Violation scan complete"
        );
        violations
    }
}

impl Default for ViolationDetector {
    fn default() -> Self {
        Self::from_policy(&ViolationPolicy::default())
    }
}
