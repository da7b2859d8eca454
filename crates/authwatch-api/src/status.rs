//! Status snapshots published by a running monitor

use authwatch_util::MonitorId;
use serde::{Deserialize, Serialize};

use crate::{DialogKind, DismissalRecord, MonitorState, TokenInfo};

/// Point-in-time view of a monitor, for logs and observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub monitor_id: MonitorId,
    /// `None` until the monitor has been started
    pub state: Option<MonitorState>,
    pub token: Option<TokenInfo>,
    pub dismissal: Option<DismissalRecord>,
    /// Dialog currently on screen, if any
    pub open_dialog: Option<DialogKind>,
}

impl MonitorStatus {
    pub fn is_blocked(&self) -> bool {
        self.state == Some(MonitorState::Blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_blocked_state_is_blocked() {
        let mut status = MonitorStatus {
            monitor_id: MonitorId::new(),
            state: None,
            token: None,
            dismissal: None,
            open_dialog: None,
        };
        assert!(!status.is_blocked());

        status.state = Some(MonitorState::Warning);
        assert!(!status.is_blocked());

        status.state = Some(MonitorState::Blocked);
        assert!(status.is_blocked());
    }

    #[test]
    fn status_round_trips_through_json() {
        let status = MonitorStatus {
            monitor_id: MonitorId::new(),
            state: Some(MonitorState::Warning),
            token: Some(TokenInfo::new("alice", 1, 2)),
            dismissal: None,
            open_dialog: Some(DialogKind::Warning { minutes_left: 2 }),
        };
        let json = serde_json::to_string(&status).unwrap();
        let parsed: MonitorStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }
}
