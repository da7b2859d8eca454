//! KBase Auth2 adapters for authwatch
//!
//! This crate provides the concrete collaborators used against a KBase
//! deployment:
//! - Credential lookup from a cookie file or environment variable
//! - `TokenSource` backed by `GET /services/auth/api/V2/token`
//! - `ReauthAction` that logs out and sends the user to the login page

mod credentials;
mod endpoints;
mod reauth;
mod token_source;

pub use credentials::*;
pub use endpoints::*;
pub use reauth::*;
pub use token_source::*;

use authwatch_util::{AuthwatchError, Result};
use std::time::Duration;

/// Build the HTTP client shared by the token source and the logout call
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| AuthwatchError::transport(format!("failed to create HTTP client: {e}")))
}
