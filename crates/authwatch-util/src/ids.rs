//! Strongly-typed identifiers for authwatch

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one monitor instance
///
/// Every log line emitted by a monitor carries this id, so several monitors
/// can run side by side (in tests, or one per credential) without their
/// output interleaving into something unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorId(Uuid);

impl MonitorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MonitorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_id_uniqueness() {
        let a = MonitorId::new();
        let b = MonitorId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn monitor_id_serialize_deserialize() {
        let id = MonitorId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: MonitorId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
