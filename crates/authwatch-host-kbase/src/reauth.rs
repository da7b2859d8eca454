//! Logout followed by a redirect to the login page

use async_trait::async_trait;
use authwatch_host_api::{CredentialStore, HostError, HostResult, Navigator, ReauthAction};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::AuthEndpoints;

/// Header the Auth2 logout endpoint reads the session token from
pub const LOGOUT_TOKEN_HEADER: &str = "x-kbase-ui-auth";

/// `ReauthAction` that invalidates the session and opens the login page
///
/// Logout failures are logged and never stop the redirect.
pub struct Auth2Reauth {
    client: reqwest::Client,
    logout_url: Url,
    login_url: Url,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl Auth2Reauth {
    pub fn new(
        client: reqwest::Client,
        endpoints: &AuthEndpoints,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            logout_url: endpoints.logout_url().clone(),
            login_url: endpoints.login_url().clone(),
            credentials,
            navigator,
        }
    }

    /// Invalidate the current session. Returns false when there was no
    /// credential to log out.
    pub async fn logout(&self) -> HostResult<bool> {
        let Some(token) = self.credentials.credential() else {
            return Ok(false);
        };

        let response = self
            .client
            .post(self.logout_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(LOGOUT_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| HostError::LogoutFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostError::LogoutFailed(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }
        Ok(true)
    }
}

#[async_trait]
impl ReauthAction for Auth2Reauth {
    async fn invoke(&self) {
        match self.logout().await {
            Ok(true) => info!("Session logged out"),
            Ok(false) => debug!("No credential, skipping logout"),
            Err(e) => warn!(error = %e, "Failed to log out session"),
        }

        info!(url = %self.login_url, "Redirecting to login");
        if let Err(e) = self.navigator.navigate(self.login_url.as_str()).await {
            error!(error = %e, "Failed to open login page");
        }
    }
}
