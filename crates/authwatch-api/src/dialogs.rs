//! Dialog kinds, outcomes and their rendered content

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the three monitor dialogs to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DialogKind {
    /// No credential was found (or it could not be verified)
    NoCredential,
    /// Dismissible warning before expiry
    Warning { minutes_left: u64 },
    /// The credential has expired
    Blocked,
}

impl DialogKind {
    /// Whether the user may close the dialog without re-authenticating
    pub fn is_dismissible(&self) -> bool {
        matches!(self, DialogKind::Warning { .. })
    }

    pub fn content(&self) -> DialogContent {
        match *self {
            DialogKind::NoCredential => DialogContent {
                title: "Authentication Required".into(),
                headline: "No KBase session token found.".into(),
                body: vec![
                    "You must authenticate with KBase to use this notebook server.".into(),
                ],
                dismiss_label: None,
                accept_label: "Authenticate".into(),
            },
            DialogKind::Warning { minutes_left } => DialogContent {
                title: "Session Expiring Soon".into(),
                headline: format!(
                    "Your session token will expire in {} minute{}.",
                    minutes_left,
                    if minutes_left == 1 { "" } else { "s" }
                ),
                body: vec![
                    "To continue working, please re-authenticate with KBase.".into(),
                    "You can dismiss this warning, but it will appear again in one minute \
                     if you haven't re-authenticated."
                        .into(),
                ],
                dismiss_label: Some("Dismiss".into()),
                accept_label: "Re-authenticate".into(),
            },
            DialogKind::Blocked => DialogContent {
                title: "Session Expired".into(),
                headline: "Your session token has expired.".into(),
                body: vec![
                    "You must re-authenticate with KBase to continue working.".into(),
                    "Any unsaved work may be lost. Please save your notebooks before \
                     re-authenticating."
                        .into(),
                ],
                dismiss_label: None,
                accept_label: "Re-authenticate".into(),
            },
        }
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogKind::NoCredential => f.write_str("no-credential"),
            DialogKind::Warning { minutes_left } => write!(f, "warning({minutes_left}m)"),
            DialogKind::Blocked => f.write_str("blocked"),
        }
    }
}

/// Text and buttons of a dialog, independent of how it is rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogContent {
    pub title: String,
    pub headline: String,
    pub body: Vec<String>,
    /// Label of the cancel button; `None` for blocking dialogs
    pub dismiss_label: Option<String>,
    pub accept_label: String,
}

/// How the user resolved a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogOutcome {
    pub accepted: bool,
}

impl DialogOutcome {
    pub fn accepted() -> Self {
        Self { accepted: true }
    }

    pub fn dismissed() -> Self {
        Self { accepted: false }
    }
}

/// Identifies one request to show a dialog
///
/// A dialog that is force-dismissed still resolves; its ticket no longer
/// matches the open dialog, so the resolution is recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DialogTicket(u64);

impl DialogTicket {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for DialogTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_content_pluralizes_minutes() {
        let one = DialogKind::Warning { minutes_left: 1 }.content();
        assert_eq!(one.headline, "Your session token will expire in 1 minute.");

        let three = DialogKind::Warning { minutes_left: 3 }.content();
        assert_eq!(three.headline, "Your session token will expire in 3 minutes.");
        assert_eq!(three.dismiss_label.as_deref(), Some("Dismiss"));
        assert_eq!(three.accept_label, "Re-authenticate");
    }

    #[test]
    fn blocking_dialogs_have_a_single_button() {
        for kind in [DialogKind::NoCredential, DialogKind::Blocked] {
            assert!(!kind.is_dismissible());
            assert!(kind.content().dismiss_label.is_none());
        }
        assert_eq!(DialogKind::NoCredential.content().accept_label, "Authenticate");
        assert_eq!(DialogKind::Blocked.content().title, "Session Expired");
    }

    #[test]
    fn tickets_increase() {
        let t = DialogTicket::new(1);
        assert_eq!(t.next(), DialogTicket::new(2));
        assert!(t < t.next());
    }

    #[test]
    fn dialog_kind_serializes_tagged() {
        let json = serde_json::to_string(&DialogKind::Warning { minutes_left: 4 }).unwrap();
        assert_eq!(json, r#"{"kind":"warning","minutes_left":4}"#);
    }
}
