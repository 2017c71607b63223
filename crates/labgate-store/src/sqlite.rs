//! SQLite-based store implementation

use chrono::{DateTime, Local};
use labgate_util::MachineId;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AccessEvent, AccessLog, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path, creating its directory if needed
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Raw access history (append-only)
            CREATE TABLE IF NOT EXISTS access_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                identity_name TEXT NOT NULL,
                identity_email TEXT NOT NULL,
                school TEXT NOT NULL,
                machine_id TEXT NOT NULL
            );

            -- Compact occupancy trail (append-only text lines, tagged by machine)
            CREATE TABLE IF NOT EXISTS compact_trail (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                machine_id TEXT NOT NULL,
                line TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_events_machine ON access_events(machine_id);
            CREATE INDEX IF NOT EXISTS idx_trail_machine ON compact_trail(machine_id, id);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl AccessLog for SqliteStore {
    fn append_event(&self, event: &AccessEvent) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO access_events (timestamp, identity_name, identity_email, school, machine_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                event.timestamp.to_rfc3339(),
                event.identity_name,
                event.identity_email,
                event.school,
                event.machine_id.as_str(),
            ],
        )?;

        debug!(
            event_id = conn.last_insert_rowid(),
            machine = %event.machine_id,
            "Access event appended"
        );
        Ok(())
    }

    fn all_events(&self) -> StoreResult<Vec<AccessEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, timestamp, identity_name, identity_email, school, machine_id
            FROM access_events ORDER BY id ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, identity_name, identity_email, school, machine_id) = row?;
            let timestamp = match DateTime::parse_from_rfc3339(&timestamp_str) {
                Ok(dt) => dt.with_timezone(&Local),
                Err(e) => {
                    warn!(event_id = id, timestamp = %timestamp_str, error = %e, "Skipping event with unreadable timestamp");
                    continue;
                }
            };

            events.push(AccessEvent {
                timestamp,
                identity_name,
                identity_email,
                school,
                machine_id: MachineId::new(machine_id),
            });
        }

        Ok(events)
    }

    fn latest_compact_line(&self, machine: &MachineId) -> StoreResult<Option<String>> {
        let conn = self.conn()?;

        let line: Option<String> = conn
            .query_row(
                "SELECT line FROM compact_trail WHERE machine_id = ? ORDER BY id DESC LIMIT 1",
                [machine.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(line)
    }

    fn append_compact_line(&self, machine: &MachineId, line: &str) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO compact_trail (machine_id, line) VALUES (?, ?)",
            params![machine.as_str(), line],
        )?;

        debug!(machine = %machine, "Compact trail line appended");
        Ok(())
    }

    fn compact_trail(&self, machine: Option<&MachineId>) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;

        let lines = match machine {
            Some(machine) => {
                let mut stmt = conn.prepare(
                    "SELECT line FROM compact_trail WHERE machine_id = ? ORDER BY id ASC",
                )?;
                let rows = stmt.query_map([machine.as_str()], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare("SELECT line FROM compact_trail ORDER BY id ASC")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()?
            }
        };

        Ok(lines)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(name: &str, machine: &str, minute: u32) -> AccessEvent {
        AccessEvent::new(
            Local.with_ymd_and_hms(2025, 12, 29, 8, minute, 0).unwrap(),
            name,
            format!("{}@example.org", name.to_lowercase()),
            "Central",
            MachineId::new(machine),
        )
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn test_events_come_back_in_insertion_order() {
        let store = SqliteStore::in_memory().unwrap();

        // Deliberately out of chronological order
        store.append_event(&event("Bruno", "PC 01", 40)).unwrap();
        store.append_event(&event("Ana", "PC 01", 31)).unwrap();

        let events = store.all_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].identity_name, "Bruno");
        assert_eq!(events[1].identity_name, "Ana");
        assert_eq!(events[1], event("Ana", "PC 01", 31));
    }

    #[test]
    fn test_unreadable_timestamps_are_skipped() {
        let store = SqliteStore::in_memory().unwrap();
        store.append_event(&event("Ana", "PC 01", 31)).unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO access_events (timestamp, identity_name, identity_email, school, machine_id) VALUES ('??', 'X', 'x', 'S', 'PC 01')",
                [],
            )
            .unwrap();

        let events = store.all_events().unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_latest_compact_line_is_keyed_by_machine() {
        let store = SqliteStore::in_memory().unwrap();
        let pc1 = MachineId::new("PC 01");
        let pc2 = MachineId::new("PC 02");

        assert!(store.latest_compact_line(&pc1).unwrap().is_none());

        store.append_compact_line(&pc1, "first").unwrap();
        store.append_compact_line(&pc2, "other").unwrap();
        store.append_compact_line(&pc1, "second").unwrap();

        assert_eq!(store.latest_compact_line(&pc1).unwrap().as_deref(), Some("second"));
        assert_eq!(store.latest_compact_line(&pc2).unwrap().as_deref(), Some("other"));

        assert_eq!(store.compact_trail(Some(&pc1)).unwrap(), vec!["first", "second"]);
        assert_eq!(store.compact_trail(None).unwrap().len(), 3);
    }

    #[test]
    fn test_on_disk_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("labgate.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.append_event(&event("Ana", "PC 01", 31)).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.all_events().unwrap().len(), 1);
    }
}
