//! Terminal dialogs and navigation

use async_trait::async_trait;
use authwatch_api::{DialogContent, DialogKind, DialogOutcome};
use authwatch_host_api::{DialogGateway, HostError, HostResult, Navigator};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::{debug, info};

/// Dialogs rendered on stdout and answered with a line of input
///
/// Dismissible dialogs are accepted with `r`/`y`; anything else (including
/// end of input) dismisses them. Blocking dialogs are acknowledged by any
/// line or by end of input.
pub struct ConsoleDialogs {
    input: Mutex<mpsc::Receiver<String>>,
    closed: Notify,
}

impl ConsoleDialogs {
    /// Answer dialogs from lines arriving on `input`
    pub fn from_lines(input: mpsc::Receiver<String>) -> Self {
        Self {
            input: Mutex::new(input),
            closed: Notify::new(),
        }
    }

    /// Answer dialogs from the process's stdin
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });
        Self::from_lines(rx)
    }
}

#[async_trait]
impl DialogGateway for ConsoleDialogs {
    async fn show(&self, kind: DialogKind) -> DialogOutcome {
        println!("{}", render(&kind.content()));

        let mut input = self.input.lock().await;
        tokio::select! {
            line = input.recv() => outcome_for(kind, line.as_deref()),
            _ = self.closed.notified() => {
                println!("(closed)");
                DialogOutcome::dismissed()
            }
        }
    }

    async fn dismiss(&self) {
        self.closed.notify_waiters();
    }
}

/// Plain-text rendering of a dialog
pub fn render(content: &DialogContent) -> String {
    let rule = "=".repeat(content.title.chars().count().max(40));
    let mut out = format!("{rule}\n{}\n{rule}\n{}\n", content.title, content.headline);
    for paragraph in &content.body {
        out.push('\n');
        out.push_str(paragraph);
        out.push('\n');
    }
    out.push('\n');
    match &content.dismiss_label {
        Some(dismiss) => out.push_str(&format!(
            "[r] {}   [Enter] {}",
            content.accept_label, dismiss
        )),
        None => out.push_str(&format!("[Enter] {}", content.accept_label)),
    }
    out
}

fn outcome_for(kind: DialogKind, line: Option<&str>) -> DialogOutcome {
    if !kind.is_dismissible() {
        return DialogOutcome::accepted();
    }
    match line.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
        Some("r" | "y" | "yes") => DialogOutcome::accepted(),
        _ => DialogOutcome::dismissed(),
    }
}

/// Prints the login URL and optionally hands it to an opener program
pub struct ConsoleNavigator {
    open_command: Option<Vec<String>>,
}

impl ConsoleNavigator {
    pub fn new(open_command: Option<Vec<String>>) -> Self {
        Self { open_command }
    }
}

#[async_trait]
impl Navigator for ConsoleNavigator {
    async fn navigate(&self, url: &str) -> HostResult<()> {
        println!("Open this URL to sign in again:\n  {url}");

        let Some((program, args)) = self.open_command.as_ref().and_then(|argv| argv.split_first())
        else {
            return Ok(());
        };

        info!(program = %program, "Opening login page");
        let status = Command::new(program).args(args).arg(url).status().await?;
        if !status.success() {
            return Err(HostError::NavigationFailed(format!(
                "{program} exited with {status}"
            )));
        }
        Ok(())
    }
}
