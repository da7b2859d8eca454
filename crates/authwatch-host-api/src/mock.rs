//! Mock collaborators for testing

use async_trait::async_trait;
use authwatch_api::{DialogKind, DialogOutcome};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

use crate::{
    CredentialStore, DialogGateway, FetchError, FetchResult, HostError, HostResult, Navigator,
    ReauthAction, TokenSource,
};

/// Token source returning scripted results
///
/// Results queued with `push_result` are returned first, in order; once the
/// queue is empty every fetch returns the fallback.
pub struct MockTokenSource {
    queue: Mutex<VecDeque<FetchResult>>,
    fallback: Mutex<FetchResult>,
    fetches: AtomicUsize,
}

impl MockTokenSource {
    pub fn new(fallback: FetchResult) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn push_result(&self, result: FetchResult) {
        self.queue.lock().unwrap().push_back(result);
    }

    pub fn set_fallback(&self, result: FetchResult) {
        *self.fallback.lock().unwrap() = result;
    }

    /// Number of fetches performed so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for MockTokenSource {
    fn default() -> Self {
        Self::new(Err(FetchError::NoCredential))
    }
}

#[async_trait]
impl TokenSource for MockTokenSource {
    async fn fetch_token(&self) -> FetchResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let queued = self.queue.lock().unwrap().pop_front();
        match queued {
            Some(result) => result,
            None => self.fallback.lock().unwrap().clone(),
        }
    }
}

struct OpenDialog {
    kind: DialogKind,
    respond: oneshot::Sender<DialogOutcome>,
}

#[derive(Default)]
struct DialogState {
    shown: Vec<DialogKind>,
    current: Option<OpenDialog>,
    dismissals: usize,
    pending_shows: usize,
    max_pending_shows: usize,
    auto_outcome: Option<DialogOutcome>,
}

impl DialogState {
    fn take_current(&mut self) -> Option<OpenDialog> {
        let dialog = self.current.take();
        if dialog.is_some() {
            self.pending_shows -= 1;
        }
        dialog
    }
}

/// Dialog gateway whose dialogs are resolved by the test
pub struct MockDialogs {
    state: Arc<Mutex<DialogState>>,
    changed: Arc<Notify>,
}

impl MockDialogs {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DialogState::default())),
            changed: Arc::new(Notify::new()),
        }
    }

    /// Resolve every dialog immediately with `outcome`
    pub fn with_auto_outcome(self, outcome: DialogOutcome) -> Self {
        self.state.lock().unwrap().auto_outcome = Some(outcome);
        self
    }

    /// Every dialog requested so far, in order
    pub fn shown(&self) -> Vec<DialogKind> {
        self.state.lock().unwrap().shown.clone()
    }

    /// Dialog currently on screen
    pub fn open_dialog(&self) -> Option<DialogKind> {
        self.state.lock().unwrap().current.as_ref().map(|d| d.kind)
    }

    /// Number of explicit `dismiss` calls
    pub fn dismiss_count(&self) -> usize {
        self.state.lock().unwrap().dismissals
    }

    /// Highest number of unresolved `show` calls seen at once
    pub fn max_pending_shows(&self) -> usize {
        self.state.lock().unwrap().max_pending_shows
    }

    /// Answer the open dialog. Returns false if nothing was open.
    pub fn resolve(&self, outcome: DialogOutcome) -> bool {
        let current = self.state.lock().unwrap().take_current();
        match current {
            Some(dialog) => dialog.respond.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Wait until at least `count` dialogs have been requested
    pub async fn wait_for_shown(&self, count: usize) {
        loop {
            let notified = self.changed.notified();
            if self.state.lock().unwrap().shown.len() >= count {
                return;
            }
            notified.await;
        }
    }
}

impl Default for MockDialogs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DialogGateway for MockDialogs {
    async fn show(&self, kind: DialogKind) -> DialogOutcome {
        let rx = {
            let mut state = self.state.lock().unwrap();
            if let Some(previous) = state.take_current() {
                let _ = previous.respond.send(DialogOutcome::dismissed());
            }
            state.shown.push(kind);

            if let Some(outcome) = state.auto_outcome {
                drop(state);
                self.changed.notify_waiters();
                return outcome;
            }

            let (tx, rx) = oneshot::channel();
            state.current = Some(OpenDialog { kind, respond: tx });
            state.pending_shows += 1;
            state.max_pending_shows = state.max_pending_shows.max(state.pending_shows);
            rx
        };
        self.changed.notify_waiters();

        let outcome = rx.await.unwrap_or(DialogOutcome::dismissed());
        self.changed.notify_waiters();
        outcome
    }

    async fn dismiss(&self) {
        let mut state = self.state.lock().unwrap();
        state.dismissals += 1;
        if let Some(dialog) = state.take_current() {
            let _ = dialog.respond.send(DialogOutcome::dismissed());
        }
    }
}

/// Re-authentication action that only counts invocations
#[derive(Default)]
pub struct MockReauth {
    invocations: AtomicUsize,
    invoked: Notify,
}

impl MockReauth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub async fn wait_for_invocation(&self) {
        loop {
            let notified = self.invoked.notified();
            if self.invocations() > 0 {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl ReauthAction for MockReauth {
    async fn invoke(&self) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.invoked.notify_waiters();
    }
}

/// Credential store with a settable value
#[derive(Default)]
pub struct MockCredentials {
    value: Mutex<Option<String>>,
}

impl MockCredentials {
    pub fn new(value: Option<&str>) -> Self {
        Self {
            value: Mutex::new(value.map(str::to_string)),
        }
    }

    pub fn set(&self, value: Option<&str>) {
        *self.value.lock().unwrap() = value.map(str::to_string);
    }
}

impl CredentialStore for MockCredentials {
    fn credential(&self) -> Option<String> {
        self.value.lock().unwrap().clone()
    }
}

/// Navigator that records every URL it is asked to open
#[derive(Default)]
pub struct MockNavigator {
    visited: Mutex<Vec<String>>,
    /// Configure navigation to fail
    pub fail: Mutex<bool>,
}

impl MockNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Navigator for MockNavigator {
    async fn navigate(&self, url: &str) -> HostResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(HostError::NavigationFailed("Mock navigation failure".into()));
        }
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
