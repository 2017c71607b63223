//! Store trait definitions

use labgate_util::MachineId;

use crate::{AccessEvent, StoreResult};

/// Append-only access log: the raw history plus the compact occupancy trail.
///
/// No update or delete operations exist. Callers that need "the current
/// occupant" of a machine read the most recent trail line for it and reason
/// from that, without holding any lock across the read and the append.
pub trait AccessLog: Send + Sync {
    // Raw history

    /// Append one accepted login
    fn append_event(&self, event: &AccessEvent) -> StoreResult<()>;

    /// Full history in insertion order
    fn all_events(&self) -> StoreResult<Vec<AccessEvent>>;

    // Compact trail

    /// Most recent trail line tagged with `machine`
    fn latest_compact_line(&self, machine: &MachineId) -> StoreResult<Option<String>>;

    /// Append a trail line tagged with `machine`
    fn append_compact_line(&self, machine: &MachineId, line: &str) -> StoreResult<()>;

    /// Trail lines in insertion order, optionally for one machine
    fn compact_trail(&self, machine: Option<&MachineId>) -> StoreResult<Vec<String>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
