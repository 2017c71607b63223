//! Compact audit trail decisions

use chrono::TimeDelta;
use labgate_config::AuditPolicy;
use labgate_store::{AccessEvent, CompactRecord};
use std::time::Duration;
use tracing::{debug, warn};

/// What to do with the compact trail for a new login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactDecision {
    /// Same occupant, recently recorded
    Suppress,
    /// Write this record as the machine's new latest line
    Append(CompactRecord),
}

/// Decides whether a login changes the compact trail.
///
/// A login is significant when the machine has no readable prior record, when
/// the occupant changed, or when the same occupant returns after the re-audit
/// interval.
#[derive(Debug, Clone)]
pub struct AccessCompactor {
    reaudit_after: TimeDelta,
}

impl AccessCompactor {
    pub fn new(reaudit_after: Duration) -> Self {
        Self {
            reaudit_after: TimeDelta::from_std(reaudit_after).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn from_policy(policy: &AuditPolicy) -> Self {
        Self::new(policy.reaudit_after)
    }

    /// Decide given the machine's most recent trail line, if any
    pub fn compact(&self, prior_line: Option<&str>, event: &AccessEvent) -> CompactDecision {
        let Some(line) = prior_line else {
            debug!(machine = %event.machine_id, "No prior trail record");
            return self.append(event);
        };

        let prior = match CompactRecord::parse_line(line, &event.machine_id) {
            Ok(prior) => prior,
            Err(e) => {
                warn!(
                    machine = %event.machine_id,
                    line = %line,
                    error = %e,
                    "Unreadable trail record, treating machine as unrecorded"
                );
                return self.append(event);
            }
        };

        if prior.identity_name != event.identity_name {
            debug!(
                machine = %event.machine_id,
                from = %prior.identity_name,
                to = %event.identity_name,
                "Occupant changed"
            );
            return self.append(event);
        }

        if event.timestamp - prior.timestamp >= self.reaudit_after {
            debug!(machine = %event.machine_id, identity = %event.identity_name, "Re-auditing returning occupant");
            return self.append(event);
        }

        CompactDecision::Suppress
    }

    fn append(&self, event: &AccessEvent) -> CompactDecision {
        CompactDecision::Append(CompactRecord::from_event(event))
    }
}

impl Default for AccessCompactor {
    fn default() -> Self {
        Self::from_policy(&AuditPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, TimeZone};
    use labgate_util::MachineId;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 12, 29, h, m, 0).unwrap()
    }

    fn event(name: &str, machine: &str, ts: DateTime<Local>) -> AccessEvent {
        AccessEvent::new(ts, name, "x@example.org", "S", MachineId::new(machine))
    }

    fn line_for(name: &str, machine: &str, ts: DateTime<Local>) -> String {
        CompactRecord::from_event(&event(name, machine, ts)).to_line()
    }

    #[test]
    fn test_first_event_appends() {
        let compactor = AccessCompactor::default();
        let e = event("Ana", "PC 01", at(8, 31));

        assert_eq!(
            compactor.compact(None, &e),
            CompactDecision::Append(CompactRecord::from_event(&e))
        );
    }

    #[test]
    fn test_same_identity_within_interval_suppresses() {
        let compactor = AccessCompactor::default();
        let prior = line_for("Ana", "PC 01", at(8, 0));

        for (h, m) in [(8, 0), (8, 1), (9, 30), (9, 59)] {
            let e = event("Ana", "PC 01", at(h, m));
            assert_eq!(compactor.compact(Some(&prior), &e), CompactDecision::Suppress);
        }
    }

    #[test]
    fn test_same_identity_after_interval_appends() {
        let compactor = AccessCompactor::default();
        let prior = line_for("Ana", "PC 01", at(8, 0));

        // Exactly two hours counts as stale
        let e = event("Ana", "PC 01", at(10, 0));
        assert!(matches!(compactor.compact(Some(&prior), &e), CompactDecision::Append(_)));

        let e = event("Ana", "PC 01", at(13, 15));
        assert!(matches!(compactor.compact(Some(&prior), &e), CompactDecision::Append(_)));
    }

    #[test]
    fn test_different_identity_always_appends() {
        let compactor = AccessCompactor::default();
        let prior = line_for("Ana", "PC 01", at(8, 0));

        for (h, m) in [(8, 0), (8, 1), (12, 0)] {
            let e = event("Bruno", "PC 01", at(h, m));
            assert!(matches!(compactor.compact(Some(&prior), &e), CompactDecision::Append(_)));
        }
    }

    #[test]
    fn test_decision_ignores_call_order_and_repetition() {
        let compactor = AccessCompactor::default();
        let prior = line_for("Ana", "PC 01", at(8, 0));
        let events = [
            event("Ana", "PC 01", at(9, 0)),
            event("Bruno", "PC 01", at(8, 30)),
            event("Ana", "PC 01", at(11, 0)),
        ];

        let forward: Vec<_> = events
            .iter()
            .map(|e| compactor.compact(Some(&prior), e))
            .collect();
        let backward: Vec<_> = events
            .iter()
            .rev()
            .map(|e| compactor.compact(Some(&prior), e))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        assert_eq!(forward, backward);

        for _ in 0..3 {
            assert_eq!(compactor.compact(Some(&prior), &events[0]), CompactDecision::Suppress);
        }
    }

    #[test]
    fn test_corrupt_prior_appends() {
        let compactor = AccessCompactor::default();
        let e = event("Ana", "PC 01", at(8, 31));

        for bad in ["", "garbage", "Ana accessed PC 01 - not a date"] {
            assert!(matches!(compactor.compact(Some(bad), &e), CompactDecision::Append(_)));
        }
    }

    #[test]
    fn test_prior_for_other_machine_appends() {
        let compactor = AccessCompactor::default();
        let prior = line_for("Ana", "PC 02", at(8, 0));
        let e = event("Ana", "PC 01", at(8, 5));

        assert!(matches!(compactor.compact(Some(&prior), &e), CompactDecision::Append(_)));
    }

    #[test]
    fn test_custom_interval() {
        let compactor = AccessCompactor::new(Duration::from_secs(30 * 60));
        let prior = line_for("Ana", "PC 01", at(8, 0));

        let e = event("Ana", "PC 01", at(8, 29));
        assert_eq!(compactor.compact(Some(&prior), &e), CompactDecision::Suppress);
        let e = event("Ana", "PC 01", at(8, 30));
        assert!(matches!(compactor.compact(Some(&prior), &e), CompactDecision::Append(_)));
    }
}
