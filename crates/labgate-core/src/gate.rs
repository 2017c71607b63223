//! Login gating: who may pick an account on this machine right now

use chrono::{DateTime, Local};
use labgate_config::{Identity, Roster, ScheduleSlot};
use labgate_util::{LabgateError, Result};
use tracing::debug;

use crate::ScheduleResolver;

/// The class in session and the accounts it may use
#[derive(Debug, Clone)]
pub struct Permit<'a> {
    pub slot: &'a ScheduleSlot,
    pub identities: Vec<&'a Identity>,
}

/// Combines the schedule with the roster
#[derive(Debug)]
pub struct Gate {
    resolver: ScheduleResolver,
    roster: Roster,
}

impl Gate {
    pub fn new(resolver: ScheduleResolver, roster: Roster) -> Result<Self> {
        if roster.is_empty() {
            return Err(LabgateError::EmptyRoster);
        }
        Ok(Self { resolver, roster })
    }

    pub fn resolver(&self) -> &ScheduleResolver {
        &self.resolver
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Identities allowed at `now`, sorted by display name
    pub fn permitted(&self, now: &DateTime<Local>) -> Result<Permit<'_>> {
        let slot = self
            .resolver
            .resolve(now)
            .ok_or(LabgateError::OutsideSchedule)?;

        let identities = self
            .roster
            .class_members(&slot.school, &slot.grade, &slot.group);

        if identities.is_empty() {
            return Err(LabgateError::ClassNotInRoster {
                school: slot.school.clone(),
                grade: slot.grade.clone(),
                group: slot.group.clone(),
            });
        }

        debug!(slot = %slot, count = identities.len(), "Resolved permitted identities");
        Ok(Permit { slot, identities })
    }

    /// Look up `name` among the identities permitted at `now`
    pub fn authorize(
        &self,
        name: &str,
        now: &DateTime<Local>,
    ) -> Result<(&ScheduleSlot, &Identity)> {
        let permit = self.permitted(now)?;
        let name = name.trim();

        permit
            .identities
            .into_iter()
            .find(|identity| identity.display_name == name)
            .map(|identity| (permit.slot, identity))
            .ok_or_else(|| LabgateError::IdentityNotPermitted(name.to_string()))
    }
}
