//! Token metadata from the Auth2 service

use async_trait::async_trait;
use authwatch_api::TokenInfo;
use authwatch_host_api::{CredentialStore, FetchError, FetchResult, TokenSource};
use reqwest::header::AUTHORIZATION;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::AuthEndpoints;

/// `TokenSource` backed by `GET <origin>/services/auth/api/V2/token`
pub struct Auth2TokenSource {
    client: reqwest::Client,
    token_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl Auth2TokenSource {
    pub fn new(
        client: reqwest::Client,
        endpoints: &AuthEndpoints,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client,
            token_url: endpoints.token_url().clone(),
            credentials,
        }
    }
}

#[async_trait]
impl TokenSource for Auth2TokenSource {
    async fn fetch_token(&self) -> FetchResult {
        let Some(token) = self.credentials.credential() else {
            return Err(FetchError::NoCredential);
        };

        debug!(url = %self.token_url, "Requesting token info");
        let response = self
            .client
            .get(self.token_url.clone())
            .header(AUTHORIZATION, token)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "token request failed: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        TokenInfo::from_auth2_json(&body).map_err(|e| FetchError::MalformedResponse(e.to_string()))
    }
}
