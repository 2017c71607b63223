//! Schedule resolution

use chrono::{DateTime, Local, Weekday};
use labgate_config::ScheduleSlot;

/// Maps a point in time to the class allowed on the machines.
///
/// Slots are checked in declaration order and the first match wins, so a
/// later slot that overlaps an earlier one is never returned for the
/// overlapping span.
#[derive(Debug, Clone, Default)]
pub struct ScheduleResolver {
    slots: Vec<ScheduleSlot>,
}

impl ScheduleResolver {
    pub fn new(slots: Vec<ScheduleSlot>) -> Self {
        Self { slots }
    }

    /// The slot in force at `now`, if any
    pub fn resolve(&self, now: &DateTime<Local>) -> Option<&ScheduleSlot> {
        self.slots.iter().find(|slot| slot.contains(now))
    }

    pub fn slots(&self) -> &[ScheduleSlot] {
        &self.slots
    }

    /// Slots configured for one weekday, in declaration order
    pub fn slots_on(&self, weekday: Weekday) -> impl Iterator<Item = &ScheduleSlot> {
        self.slots.iter().filter(move |slot| slot.weekday == weekday)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use labgate_util::WallClock;

    fn slot(weekday: Weekday, start: (u8, u8), end: (u8, u8), group: &str) -> ScheduleSlot {
        ScheduleSlot {
            weekday,
            start: WallClock::new(start.0, start.1).unwrap(),
            end: WallClock::new(end.0, end.1).unwrap(),
            school: "S".into(),
            grade: "5th grade".into(),
            group: group.into(),
        }
    }

    // 2025-12-29 is a Monday
    fn monday(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 12, 29, h, m, s).unwrap()
    }

    fn resolver() -> ScheduleResolver {
        ScheduleResolver::new(vec![
            slot(Weekday::Mon, (8, 0), (9, 0), "G"),
            slot(Weekday::Mon, (10, 0), (11, 30), "H"),
            slot(Weekday::Wed, (8, 0), (9, 0), "W"),
        ])
    }

    #[test]
    fn test_inside_interval() {
        let r = resolver();
        assert_eq!(r.resolve(&monday(8, 30, 0)).unwrap().group, "G");
        assert_eq!(r.resolve(&monday(10, 45, 12)).unwrap().group, "H");
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let r = resolver();
        assert_eq!(r.resolve(&monday(8, 0, 0)).unwrap().group, "G");
        assert_eq!(r.resolve(&monday(9, 0, 0)).unwrap().group, "G");
        assert!(r.resolve(&monday(9, 0, 1)).is_none());
        assert!(r.resolve(&monday(7, 59, 59)).is_none());
    }

    #[test]
    fn test_gap_between_slots() {
        let r = resolver();
        assert!(r.resolve(&monday(9, 30, 0)).is_none());
    }

    #[test]
    fn test_weekday_without_slots() {
        let r = resolver();
        let tuesday = Local.with_ymd_and_hms(2025, 12, 30, 8, 30, 0).unwrap();
        assert!(r.resolve(&tuesday).is_none());

        let wednesday = Local.with_ymd_and_hms(2025, 12, 31, 8, 30, 0).unwrap();
        assert_eq!(r.resolve(&wednesday).unwrap().group, "W");
    }

    #[test]
    fn test_first_match_wins() {
        let r = ScheduleResolver::new(vec![
            slot(Weekday::Mon, (8, 0), (9, 0), "first"),
            slot(Weekday::Mon, (8, 30), (10, 0), "second"),
        ]);

        assert_eq!(r.resolve(&monday(8, 45, 0)).unwrap().group, "first");
        assert_eq!(r.resolve(&monday(9, 30, 0)).unwrap().group, "second");
    }

    #[test]
    fn test_empty_table() {
        let r = ScheduleResolver::default();
        assert!(r.resolve(&monday(8, 30, 0)).is_none());
    }

    #[test]
    fn test_slots_on() {
        let r = resolver();
        assert_eq!(r.slots_on(Weekday::Mon).count(), 2);
        assert_eq!(r.slots_on(Weekday::Fri).count(), 0);
        assert_eq!(r.slots().len(), 3);
    }
}
