//! Strongly-typed identifiers for labgate

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Display identity of a lab machine (its alias, or its hostname)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MachineId(String);

impl MachineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MachineId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MachineId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a supervised session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_id_equality() {
        let a = MachineId::new("lab-pc-01");
        let b = MachineId::from("lab-pc-01");
        let c = MachineId::from("lab-pc-02".to_string());

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "lab-pc-01");
        assert_eq!(a.to_string(), "lab-pc-01");
    }

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn machine_id_serializes_transparently_as_string_newtype() {
        let id = MachineId::new("PC 07");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"PC 07\"");
        let parsed: MachineId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
