//! Async driver for the expiration state machine

use authwatch_api::{DialogKind, DialogOutcome, DialogTicket, MonitorStatus};
use authwatch_config::TimingPolicy;
use authwatch_host_api::{DialogGateway, FetchResult, ReauthAction, TokenSource};
use authwatch_util::Clock;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

use crate::{ExpirationStateMachine, MonitorAction};

/// Input delivered to the monitor loop by its helper tasks
#[derive(Debug)]
enum MonitorInput {
    Fetched(FetchResult),
    DialogResolved {
        ticket: DialogTicket,
        outcome: DialogOutcome,
    },
}

/// Requests handled, in order, by the dialog worker
#[derive(Debug)]
enum DialogCommand {
    Show { ticket: DialogTicket, kind: DialogKind },
    Dismiss,
}

type PendingDialog = Pin<Box<dyn Future<Output = DialogOutcome> + Send>>;

/// Runs one `ExpirationStateMachine` against real collaborators
///
/// The machine is only ever touched from the `run` loop. Fetches and the
/// re-authentication action run as spawned tasks; all dialog calls go through
/// a single worker task so they reach the gateway in the order issued.
pub struct Monitor {
    machine: ExpirationStateMachine,
    source: Arc<dyn TokenSource>,
    dialogs: Arc<dyn DialogGateway>,
    reauth: Arc<dyn ReauthAction>,
    clock: Arc<dyn Clock>,
    status: watch::Sender<MonitorStatus>,
    inbox_tx: mpsc::UnboundedSender<MonitorInput>,
    inbox_rx: mpsc::UnboundedReceiver<MonitorInput>,
    dialog_tx: Option<mpsc::UnboundedSender<DialogCommand>>,
    fetch_task: Option<JoinHandle<()>>,
    reauth_task: Option<JoinHandle<()>>,
    check_timer: Option<Pin<Box<Sleep>>>,
    poll_timer: Option<Interval>,
}

impl Monitor {
    pub fn new(
        timing: TimingPolicy,
        source: Arc<dyn TokenSource>,
        dialogs: Arc<dyn DialogGateway>,
        reauth: Arc<dyn ReauthAction>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_machine(
            ExpirationStateMachine::new(timing),
            source,
            dialogs,
            reauth,
            clock,
        )
    }

    pub fn with_machine(
        machine: ExpirationStateMachine,
        source: Arc<dyn TokenSource>,
        dialogs: Arc<dyn DialogGateway>,
        reauth: Arc<dyn ReauthAction>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (status, _) = watch::channel(machine.status());
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Self {
            machine,
            source,
            dialogs,
            reauth,
            clock,
            status,
            inbox_tx,
            inbox_rx,
            dialog_tx: None,
            fetch_task: None,
            reauth_task: None,
            check_timer: None,
            poll_timer: None,
        }
    }

    pub fn machine(&self) -> &ExpirationStateMachine {
        &self.machine
    }

    /// Watch status snapshots, published after every processed input
    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.status.subscribe()
    }

    /// Run until the machine finishes or `shutdown` becomes true
    ///
    /// A dropped shutdown sender counts as a shutdown request. Returns the
    /// final status.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> MonitorStatus {
        let (dialog_tx, dialog_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_dialog_worker(
            self.dialogs.clone(),
            dialog_rx,
            self.inbox_tx.clone(),
        ));
        self.dialog_tx = Some(dialog_tx);

        if *shutdown.borrow_and_update() {
            let actions = self.machine.stop();
            self.apply(actions);
        } else {
            let actions = self.machine.start(self.clock.now_ms());
            self.apply(actions);
        }

        while !self.machine.is_finished() {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(monitor_id = %self.machine.id(), "Shutdown requested");
                        let actions = self.machine.stop();
                        self.apply(actions);
                    }
                }

                Some(input) = self.inbox_rx.recv() => {
                    let now = self.clock.now_ms();
                    let actions = match input {
                        MonitorInput::Fetched(result) => {
                            self.fetch_task = None;
                            self.machine.on_poll_result(result, now)
                        }
                        MonitorInput::DialogResolved { ticket, outcome } => {
                            self.machine.on_dialog_resolved(ticket, outcome, now)
                        }
                    };
                    self.apply(actions);
                }

                _ = wait_for_check(&mut self.check_timer) => {
                    self.check_timer = None;
                    let actions = self.machine.tick(self.clock.now_ms());
                    self.apply(actions);
                }

                _ = wait_for_poll(&mut self.poll_timer) => {
                    let actions = self.machine.poll_due(self.clock.now_ms());
                    self.apply(actions);
                }
            }
        }

        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        if let Some(task) = self.reauth_task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Re-authentication task failed");
        }

        let status = self.machine.status();
        self.status.send_replace(status.clone());
        status
    }

    fn apply(&mut self, actions: Vec<MonitorAction>) {
        for action in actions {
            match action {
                MonitorAction::StateChanged { .. } => {}
                MonitorAction::FetchToken { attempt, delay } => self.spawn_fetch(attempt, delay),
                MonitorAction::StartPolling { interval } => {
                    let Some(first) = Instant::now().checked_add(interval) else {
                        warn!(
                            monitor_id = %self.machine.id(),
                            interval_secs = interval.as_secs(),
                            "Poll interval out of range, background polling disabled"
                        );
                        continue;
                    };
                    let mut timer = time::interval_at(first, interval);
                    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    self.poll_timer = Some(timer);
                }
                MonitorAction::StopPolling => self.poll_timer = None,
                MonitorAction::ScheduleCheck { delay } => {
                    self.check_timer = Some(Box::pin(time::sleep(delay)));
                }
                MonitorAction::CancelCheck => self.check_timer = None,
                MonitorAction::ShowDialog { ticket, kind } => {
                    self.send_dialog(DialogCommand::Show { ticket, kind });
                }
                MonitorAction::DismissDialog => self.send_dialog(DialogCommand::Dismiss),
                MonitorAction::InvokeReauth => {
                    let reauth = self.reauth.clone();
                    self.reauth_task = Some(tokio::spawn(async move { reauth.invoke().await }));
                }
            }
        }

        self.status.send_replace(self.machine.status());
    }

    fn spawn_fetch(&mut self, attempt: u32, delay: Duration) {
        if let Some(previous) = self.fetch_task.take() {
            previous.abort();
        }

        let source = self.source.clone();
        let inbox = self.inbox_tx.clone();
        self.fetch_task = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                time::sleep(delay).await;
            }
            debug!(attempt, "Fetching token");
            let result = source.fetch_token().await;
            let _ = inbox.send(MonitorInput::Fetched(result));
        }));
    }

    fn send_dialog(&self, command: DialogCommand) {
        if let Some(tx) = &self.dialog_tx
            && tx.send(command).is_err()
        {
            warn!(monitor_id = %self.machine.id(), "Dialog worker is gone");
        }
    }
}

/// Serialises dialog requests onto the gateway
///
/// At most one `show` is pending at a time: a new request replaces the
/// pending one, whose outcome is then never reported. When the command
/// channel closes the pending dialog is left on screen.
async fn run_dialog_worker(
    gateway: Arc<dyn DialogGateway>,
    mut commands: mpsc::UnboundedReceiver<DialogCommand>,
    inbox: mpsc::UnboundedSender<MonitorInput>,
) {
    let mut pending: Option<(DialogTicket, PendingDialog)> = None;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(DialogCommand::Show { ticket, kind }) => {
                    let gateway = gateway.clone();
                    let dialog: PendingDialog = Box::pin(async move { gateway.show(kind).await });
                    pending = Some((ticket, dialog));
                }
                Some(DialogCommand::Dismiss) => {
                    gateway.dismiss().await;
                    pending = None;
                }
                None => break,
            },

            (ticket, outcome) = wait_for_dialog(&mut pending) => {
                pending = None;
                if inbox
                    .send(MonitorInput::DialogResolved { ticket, outcome })
                    .is_err()
                {
                    break;
                }
            }
        }
    }
}

async fn wait_for_dialog(
    pending: &mut Option<(DialogTicket, PendingDialog)>,
) -> (DialogTicket, DialogOutcome) {
    match pending {
        Some((ticket, dialog)) => {
            let ticket = *ticket;
            (ticket, dialog.as_mut().await)
        }
        None => std::future::pending().await,
    }
}

async fn wait_for_check(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn wait_for_poll(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Wall clock that advances with tokio's clock
///
/// Anchored at `base_ms` when created. Under paused tokio time this gives
/// timer-driven code a deterministic notion of "now".
pub struct TokioClock {
    base_ms: i64,
    start: Instant,
}

impl TokioClock {
    pub fn new(base_ms: i64) -> Self {
        Self {
            base_ms,
            start: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the clock was created
    pub fn elapsed_ms(&self) -> i64 {
        self.start.elapsed().as_millis() as i64
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> i64 {
        self.base_ms + self.elapsed_ms()
    }
}
