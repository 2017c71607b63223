//! Usage summary for the operator view

use chrono::{DateTime, Local, TimeDelta};
use labgate_store::AccessEvent;
use labgate_util::MachineId;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Login counts for one machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineUsage {
    pub machine_id: MachineId,
    pub logins: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    /// Logins recent enough that the session may still be running, newest first
    pub active_now: Vec<AccessEvent>,
    pub logins_today: usize,
    pub total_logins: usize,
    /// Busiest first, ties by machine id
    pub per_machine: Vec<MachineUsage>,
}

impl UsageSummary {
    /// `active_window` is normally the session budget plus a minute
    pub fn compute(history: &[AccessEvent], now: DateTime<Local>, active_window: Duration) -> Self {
        let window = TimeDelta::from_std(active_window).unwrap_or(TimeDelta::MAX);
        let active_since = now.checked_sub_signed(window);

        let mut active_now: Vec<AccessEvent> = history
            .iter()
            .filter(|e| e.timestamp <= now && active_since.is_none_or(|since| e.timestamp > since))
            .cloned()
            .collect();
        active_now.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let today = now.date_naive();
        let logins_today = history
            .iter()
            .filter(|e| e.timestamp.date_naive() == today)
            .count();

        let mut counts: HashMap<&MachineId, usize> = HashMap::new();
        for event in history {
            *counts.entry(&event.machine_id).or_default() += 1;
        }
        let mut per_machine: Vec<MachineUsage> = counts
            .into_iter()
            .map(|(machine_id, logins)| MachineUsage {
                machine_id: machine_id.clone(),
                logins,
            })
            .collect();
        per_machine.sort_by(|a, b| {
            b.logins
                .cmp(&a.logins)
                .then_with(|| a.machine_id.cmp(&b.machine_id))
        });

        Self {
            active_now,
            logins_today,
            total_logins: history.len(),
            per_machine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 12, day, h, m, 0).unwrap()
    }

    fn event(name: &str, machine: &str, ts: DateTime<Local>) -> AccessEvent {
        AccessEvent::new(ts, name, "x@example.org", "S", MachineId::new(machine))
    }

    #[test]
    fn test_summary() {
        let history = vec![
            event("Old", "PC 03", at(26, 10, 0)),
            event("Ana", "PC 01", at(29, 8, 0)),
            event("Bruno", "PC 02", at(29, 8, 40)),
            event("Carla", "PC 01", at(29, 8, 50)),
        ];
        let now = at(29, 9, 0);

        let summary = UsageSummary::compute(&history, now, Duration::from_secs(36 * 60));

        let active: Vec<_> = summary.active_now.iter().map(|e| e.identity_name.as_str()).collect();
        assert_eq!(active, vec!["Carla", "Bruno"]);
        assert_eq!(summary.logins_today, 3);
        assert_eq!(summary.total_logins, 4);
        assert_eq!(
            summary.per_machine,
            vec![
                MachineUsage { machine_id: MachineId::new("PC 01"), logins: 2 },
                MachineUsage { machine_id: MachineId::new("PC 02"), logins: 1 },
                MachineUsage { machine_id: MachineId::new("PC 03"), logins: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_history() {
        let summary = UsageSummary::compute(&[], at(29, 9, 0), Duration::from_secs(60));
        assert!(summary.active_now.is_empty());
        assert_eq!(summary.total_logins, 0);
        assert!(summary.per_machine.is_empty());
    }
}
