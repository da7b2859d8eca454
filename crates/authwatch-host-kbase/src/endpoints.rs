//! Auth2 endpoint URLs

use authwatch_config::AuthSettings;
use authwatch_util::{AuthwatchError, Result};
use url::Url;

/// Query parameter the login page reads the return URL from
pub const RETURN_URL_PARAM: &str = "nextrequest";

/// Resolved Auth2 URLs for one deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    origin: Url,
    token_url: Url,
    logout_url: Url,
    login_url: Url,
}

impl AuthEndpoints {
    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        let origin = settings.origin.trim_end_matches('/');
        let return_url = settings.return_url.as_deref().unwrap_or(origin);

        let mut login_url = join(origin, &settings.login_path)?;
        login_url
            .query_pairs_mut()
            .append_pair(RETURN_URL_PARAM, return_url);

        Ok(Self {
            origin: parse(origin)?,
            token_url: join(origin, &settings.token_path)?,
            logout_url: join(origin, &settings.logout_path)?,
            login_url,
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// `GET` here returns metadata about the presented token
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// `POST` here invalidates the presented token
    pub fn logout_url(&self) -> &Url {
        &self.logout_url
    }

    /// Login page, carrying the URL to return to afterwards
    pub fn login_url(&self) -> &Url {
        &self.login_url
    }
}

/// Append `path` to the origin verbatim, keeping any path prefix the origin has
fn join(origin: &str, path: &str) -> Result<Url> {
    parse(&format!("{origin}{path}"))
}

fn parse(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| AuthwatchError::invalid_url(url, e))
}
