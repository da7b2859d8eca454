//! Token expiration state machine
//!
//! The machine is sans-IO: every operation takes the current time, updates
//! internal state and returns the `MonitorAction`s the driver must perform.

use authwatch_api::{
    DialogKind, DialogOutcome, DialogTicket, DismissalRecord, MonitorState, MonitorStatus,
    TokenInfo,
};
use authwatch_config::TimingPolicy;
use authwatch_host_api::{FetchError, FetchResult};
use authwatch_util::{duration_from_ms, format_timestamp_ms, MonitorId};
use tracing::{debug, info, warn};

use crate::{classify, minutes_left, MonitorAction, Phase};

/// Expiration monitor state machine
///
/// States: `Checking -> Valid <-> Warning -> Blocked`. `Blocked` is terminal.
pub struct ExpirationStateMachine {
    id: MonitorId,
    timing: TimingPolicy,
    state: Option<MonitorState>,
    token: Option<TokenInfo>,
    dismissal: Option<DismissalRecord>,
    open_dialog: Option<(DialogTicket, DialogKind)>,
    last_ticket: DialogTicket,
    next_check_at_ms: Option<i64>,
    polling: bool,
    fetch_in_flight: bool,
    failed_fetches: u32,
    reauth_invoked: bool,
    stopped: bool,
}

impl ExpirationStateMachine {
    pub fn new(timing: TimingPolicy) -> Self {
        Self::with_id(MonitorId::new(), timing)
    }

    pub fn with_id(id: MonitorId, timing: TimingPolicy) -> Self {
        Self {
            id,
            timing,
            state: None,
            token: None,
            dismissal: None,
            open_dialog: None,
            last_ticket: DialogTicket::new(0),
            next_check_at_ms: None,
            polling: false,
            fetch_in_flight: false,
            failed_fetches: 0,
            reauth_invoked: false,
            stopped: false,
        }
    }

    pub fn id(&self) -> MonitorId {
        self.id
    }

    pub fn timing(&self) -> &TimingPolicy {
        &self.timing
    }

    pub fn state(&self) -> Option<MonitorState> {
        self.state
    }

    pub fn token(&self) -> Option<&TokenInfo> {
        self.token.as_ref()
    }

    pub fn dismissal(&self) -> Option<DismissalRecord> {
        self.dismissal
    }

    /// Dialog the machine believes is on screen
    pub fn open_dialog(&self) -> Option<DialogKind> {
        self.open_dialog.map(|(_, kind)| kind)
    }

    /// Absolute time of the pending check, if one is scheduled
    pub fn next_check_at_ms(&self) -> Option<i64> {
        self.next_check_at_ms
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn is_fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn reauth_invoked(&self) -> bool {
        self.reauth_invoked
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Nothing more will happen: stopped, or blocked with re-authentication
    /// already requested
    pub fn is_finished(&self) -> bool {
        self.stopped || (self.state == Some(MonitorState::Blocked) && self.reauth_invoked)
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            monitor_id: self.id,
            state: self.state,
            token: self.token.clone(),
            dismissal: self.dismissal,
            open_dialog: self.open_dialog(),
        }
    }

    /// Enter `Checking` and request the first fetch
    pub fn start(&mut self, now_ms: i64) -> Vec<MonitorAction> {
        let mut actions = Vec::new();
        if self.stopped || self.state.is_some() {
            return actions;
        }

        info!(
            monitor_id = %self.id,
            now = %format_timestamp_ms(now_ms),
            "Expiration monitor starting"
        );

        self.transition(MonitorState::Checking, &mut actions);
        self.request_fetch(0, &mut actions);
        actions
    }

    /// Periodic poll timer fired
    pub fn poll_due(&mut self, _now_ms: i64) -> Vec<MonitorAction> {
        let mut actions = Vec::new();
        if self.stopped || self.fetch_in_flight {
            return actions;
        }
        if !matches!(
            self.state,
            Some(MonitorState::Valid) | Some(MonitorState::Warning)
        ) {
            return actions;
        }

        debug!(monitor_id = %self.id, "Background poll");
        self.request_fetch(0, &mut actions);
        actions
    }

    /// Apply the result of a token fetch (initial, retry or background poll)
    pub fn on_poll_result(&mut self, result: FetchResult, now_ms: i64) -> Vec<MonitorAction> {
        let mut actions = Vec::new();
        self.fetch_in_flight = false;

        let state = match self.state {
            Some(state) if !self.stopped && state != MonitorState::Blocked => state,
            _ => {
                debug!(monitor_id = %self.id, "Ignoring fetch result");
                return actions;
            }
        };

        match result {
            Ok(token) => {
                self.failed_fetches = 0;
                debug!(
                    monitor_id = %self.id,
                    subject = %token.subject,
                    expires_at = %format_timestamp_ms(token.expires_at_ms),
                    "Token fetched"
                );
                let expired = token.is_expired(now_ms);
                self.token = Some(token);

                if state == MonitorState::Checking {
                    if expired {
                        info!(monitor_id = %self.id, "Token already expired");
                        self.block(&mut actions);
                        self.show_dialog(DialogKind::Blocked, &mut actions);
                        return actions;
                    }
                    self.transition(MonitorState::Valid, &mut actions);
                    self.polling = true;
                    actions.push(MonitorAction::StartPolling {
                        interval: self.timing.poll_interval,
                    });
                }

                self.evaluate(now_ms, &mut actions);
            }
            Err(err) if err.is_retryable() && self.failed_fetches < self.timing.retry_attempts => {
                self.failed_fetches += 1;
                warn!(
                    monitor_id = %self.id,
                    error = %err,
                    attempt = self.failed_fetches,
                    delay_ms = self.timing.retry_delay.as_millis() as u64,
                    "Token fetch failed, retrying"
                );
                self.request_fetch(self.failed_fetches, &mut actions);
            }
            Err(err) => {
                if err == FetchError::NoCredential {
                    info!(monitor_id = %self.id, "No credential available");
                } else {
                    warn!(
                        monitor_id = %self.id,
                        error = %err,
                        "Token fetch failed, giving up"
                    );
                }
                self.failed_fetches = 0;
                self.block(&mut actions);
                self.show_dialog(DialogKind::NoCredential, &mut actions);
            }
        }

        actions
    }

    /// Re-derive the phase from the current time
    ///
    /// Called when a scheduled check fires. The pending check is always
    /// consumed; `evaluate` arms the next one unless the monitor blocks.
    pub fn tick(&mut self, now_ms: i64) -> Vec<MonitorAction> {
        let mut actions = Vec::new();
        if self.stopped {
            return actions;
        }
        if !matches!(
            self.state,
            Some(MonitorState::Valid) | Some(MonitorState::Warning)
        ) {
            return actions;
        }

        // the driver's timer is spent even if the wall clock reads early
        self.next_check_at_ms = None;
        self.evaluate(now_ms, &mut actions);
        actions
    }

    /// A dialog shown under `ticket` was resolved
    pub fn on_dialog_resolved(
        &mut self,
        ticket: DialogTicket,
        outcome: DialogOutcome,
        now_ms: i64,
    ) -> Vec<MonitorAction> {
        let mut actions = Vec::new();
        if self.stopped {
            return actions;
        }

        let kind = match self.open_dialog {
            Some((open, kind)) if open == ticket => kind,
            _ => {
                debug!(monitor_id = %self.id, %ticket, "Ignoring stale dialog resolution");
                return actions;
            }
        };
        self.open_dialog = None;

        match kind {
            DialogKind::Warning { .. } if outcome.accepted => {
                info!(monitor_id = %self.id, "Warning accepted, re-authenticating");
                self.block(&mut actions);
                self.invoke_reauth(&mut actions);
            }
            DialogKind::Warning { .. } => {
                info!(monitor_id = %self.id, "Warning dismissed");
                self.dismissal = Some(DismissalRecord::at(now_ms));
                self.transition(MonitorState::Valid, &mut actions);
                self.evaluate(now_ms, &mut actions);
            }
            DialogKind::NoCredential | DialogKind::Blocked => {
                self.invoke_reauth(&mut actions);
            }
        }

        actions
    }

    /// Tear the monitor down
    ///
    /// Cancels timers and polling and forgets the open dialog without closing
    /// it. The state is left as it was; every later input is ignored.
    pub fn stop(&mut self) -> Vec<MonitorAction> {
        let mut actions = Vec::new();
        if self.stopped {
            return actions;
        }
        self.stopped = true;

        if self.next_check_at_ms.take().is_some() {
            actions.push(MonitorAction::CancelCheck);
        }
        if self.polling {
            self.polling = false;
            actions.push(MonitorAction::StopPolling);
        }
        self.fetch_in_flight = false;
        self.open_dialog = None;

        info!(monitor_id = %self.id, state = ?self.state, "Expiration monitor stopped");
        actions
    }

    fn evaluate(&mut self, now_ms: i64, actions: &mut Vec<MonitorAction>) {
        let Some(expires_at_ms) = self.token.as_ref().map(|t| t.expires_at_ms) else {
            return;
        };

        let classification = classify(
            now_ms,
            expires_at_ms,
            self.dismissal,
            self.timing.warning_lead_ms(),
            self.timing.cooldown_ms(),
        );

        match classification.phase {
            Phase::Blocked => {
                info!(
                    monitor_id = %self.id,
                    expires_at = %format_timestamp_ms(expires_at_ms),
                    "Token expired"
                );
                self.block(actions);
                self.show_dialog(DialogKind::Blocked, actions);
            }
            Phase::Warning => {
                if self.open_dialog.is_some() {
                    self.schedule_check(now_ms, classification.next_check_delay_ms, actions);
                    return;
                }
                self.dismissal = None;
                self.transition(MonitorState::Warning, actions);
                self.show_dialog(
                    DialogKind::Warning {
                        minutes_left: minutes_left(now_ms, expires_at_ms),
                    },
                    actions,
                );
                self.schedule_check(now_ms, classification.next_check_delay_ms, actions);
            }
            Phase::Valid => {
                if self.state == Some(MonitorState::Warning) {
                    info!(monitor_id = %self.id, "Token renewed, closing warning");
                    if self.open_dialog.take().is_some() {
                        actions.push(MonitorAction::DismissDialog);
                    }
                    self.transition(MonitorState::Valid, actions);
                }
                self.schedule_check(now_ms, classification.next_check_delay_ms, actions);
            }
        }
    }

    /// Enter `Blocked`, closing any open dialog and cancelling all timers
    fn block(&mut self, actions: &mut Vec<MonitorAction>) {
        if self.state == Some(MonitorState::Blocked) {
            return;
        }

        if self.open_dialog.take().is_some() {
            actions.push(MonitorAction::DismissDialog);
        }
        self.transition(MonitorState::Blocked, actions);
        self.dismissal = None;

        if self.next_check_at_ms.take().is_some() {
            actions.push(MonitorAction::CancelCheck);
        }
        if self.polling {
            self.polling = false;
            actions.push(MonitorAction::StopPolling);
        }
    }

    fn transition(&mut self, to: MonitorState, actions: &mut Vec<MonitorAction>) {
        let from = self.state;
        if from == Some(to) {
            return;
        }
        self.state = Some(to);

        info!(monitor_id = %self.id, ?from, %to, "Monitor state changed");
        actions.push(MonitorAction::StateChanged { from, to });
    }

    fn show_dialog(&mut self, kind: DialogKind, actions: &mut Vec<MonitorAction>) {
        if self.open_dialog.take().is_some() {
            actions.push(MonitorAction::DismissDialog);
        }

        let ticket = self.last_ticket.next();
        self.last_ticket = ticket;
        self.open_dialog = Some((ticket, kind));

        debug!(monitor_id = %self.id, %ticket, ?kind, "Showing dialog");
        actions.push(MonitorAction::ShowDialog { ticket, kind });
    }

    fn schedule_check(
        &mut self,
        now_ms: i64,
        delay_ms: Option<i64>,
        actions: &mut Vec<MonitorAction>,
    ) {
        let Some(delay_ms) = delay_ms else {
            return;
        };
        let delay_ms = delay_ms.max(0);
        let at = now_ms + delay_ms;
        if self.next_check_at_ms == Some(at) {
            return;
        }

        self.next_check_at_ms = Some(at);
        debug!(
            monitor_id = %self.id,
            delay_ms,
            at = %format_timestamp_ms(at),
            "Next check scheduled"
        );
        actions.push(MonitorAction::ScheduleCheck {
            delay: duration_from_ms(delay_ms),
        });
    }

    fn request_fetch(&mut self, attempt: u32, actions: &mut Vec<MonitorAction>) {
        self.fetch_in_flight = true;
        let delay = if attempt == 0 {
            std::time::Duration::ZERO
        } else {
            self.timing.retry_delay
        };
        actions.push(MonitorAction::FetchToken { attempt, delay });
    }

    fn invoke_reauth(&mut self, actions: &mut Vec<MonitorAction>) {
        if self.reauth_invoked {
            return;
        }
        self.reauth_invoked = true;
        info!(monitor_id = %self.id, "Requesting re-authentication");
        actions.push(MonitorAction::InvokeReauth);
    }
}
