//! Actions requested by the state machine

use authwatch_api::{DialogKind, DialogTicket, MonitorState};
use std::time::Duration;

/// Side effect the driver must carry out on behalf of the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    /// State transition (informational)
    StateChanged {
        from: Option<MonitorState>,
        to: MonitorState,
    },

    /// Fetch token metadata after `delay`; `attempt` is 0 for a fresh fetch
    FetchToken { attempt: u32, delay: Duration },

    /// Begin the periodic background poll, replacing any running one
    StartPolling { interval: Duration },

    StopPolling,

    /// Call `tick` after `delay`, replacing any pending check
    ScheduleCheck { delay: Duration },

    CancelCheck,

    /// Show a dialog; its resolution must be reported with `ticket`
    ShowDialog {
        ticket: DialogTicket,
        kind: DialogKind,
    },

    /// Force-close whatever dialog is on screen
    DismissDialog,

    /// Log out and send the user to the login page
    InvokeReauth,
}
