//! Collaborator traits

use async_trait::async_trait;
use authwatch_api::{DialogKind, DialogOutcome, TokenInfo};
use thiserror::Error;

/// Errors from a single token fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No credential is present locally; the request was never sent
    #[error("No credential available")]
    NoCredential,

    /// Network failure or non-2xx response
    #[error("Transport error: {0}")]
    Transport(String),

    /// 2xx response whose body is not usable token metadata
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Whether the caller may retry the fetch
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::NoCredential => false,
            FetchError::Transport(_) | FetchError::MalformedResponse(_) => true,
        }
    }
}

pub type FetchResult = Result<TokenInfo, FetchError>;

/// Errors from host-side operations other than token fetches
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Logout failed: {0}")]
    LogoutFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// Performs one authenticated fetch of token metadata
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> FetchResult;
}

/// Modal dialog primitive supplied by the host
///
/// At most one dialog is ever visible: `show` closes any dialog that is
/// still open before presenting the new one.
#[async_trait]
pub trait DialogGateway: Send + Sync {
    /// Show a dialog and wait for the user's choice
    async fn show(&self, kind: DialogKind) -> DialogOutcome;

    /// Close the current dialog without accepting it
    async fn dismiss(&self);
}

/// Logout followed by a redirect to login
#[async_trait]
pub trait ReauthAction: Send + Sync {
    async fn invoke(&self);
}

/// Local credential storage (cookies, environment)
pub trait CredentialStore: Send + Sync {
    /// Current credential, or `None` when nothing is stored
    fn credential(&self) -> Option<String>;
}

/// Sends the user to a URL (browser, terminal hint, ...)
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, url: &str) -> HostResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_credential_is_final() {
        assert!(!FetchError::NoCredential.is_retryable());
        assert!(FetchError::Transport("503 Service Unavailable".into()).is_retryable());
        assert!(FetchError::MalformedResponse("missing expires".into()).is_retryable());
    }

    #[test]
    fn fetch_error_messages() {
        assert_eq!(FetchError::NoCredential.to_string(), "No credential available");
        assert_eq!(
            FetchError::Transport("401 Unauthorized".into()).to_string(),
            "Transport error: 401 Unauthorized"
        );
    }
}
