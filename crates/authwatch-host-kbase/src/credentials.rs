//! Local credential lookup

use authwatch_config::CredentialSettings;
use authwatch_host_api::CredentialStore;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Reads the session token from a cookie file, falling back to an
/// environment variable
///
/// The cookie file holds a `Cookie` header value (`name=value; name2=value2`,
/// optionally prefixed with `Cookie:`, possibly over several lines). It is
/// re-read on every lookup so that a fresh login is picked up.
#[derive(Debug, Clone)]
pub struct CookieCredentials {
    cookie_file: Option<PathBuf>,
    cookie_names: Vec<String>,
    env_var: String,
}

impl CookieCredentials {
    pub fn new(settings: &CredentialSettings) -> Self {
        Self {
            cookie_file: settings.cookie_file.clone(),
            cookie_names: settings.cookie_names.clone(),
            env_var: settings.env_var.clone(),
        }
    }

    fn from_cookie_file(&self) -> Option<String> {
        let path = self.cookie_file.as_ref()?;
        match std::fs::read_to_string(path) {
            Ok(content) => find_cookie(&content, &self.cookie_names),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Cookie file not found");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cookie file");
                None
            }
        }
    }

    fn from_env(&self) -> Option<String> {
        std::env::var(&self.env_var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl CredentialStore for CookieCredentials {
    fn credential(&self) -> Option<String> {
        self.from_cookie_file().or_else(|| self.from_env())
    }
}

/// First cookie, in header order, whose name is one of `names`
pub fn find_cookie(header: &str, names: &[String]) -> Option<String> {
    header
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("Cookie:").unwrap_or(line)
        })
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| !value.is_empty() && names.iter().any(|n| n == name.trim()))
        .map(|(_, value)| value.trim().to_string())
}
