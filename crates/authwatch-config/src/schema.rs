//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Auth service endpoints
    #[serde(default)]
    pub auth: RawAuthConfig,

    /// Where the local credential is read from
    #[serde(default)]
    pub credential: RawCredentialConfig,

    /// Warning, cooldown and polling intervals
    #[serde(default)]
    pub timing: RawTimingConfig,

    /// How the login URL is opened
    #[serde(default)]
    pub navigation: RawNavigationConfig,
}

/// Auth service settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAuthConfig {
    /// Origin of the auth service (default: https://ci.kbase.us)
    pub origin: Option<String>,

    /// Token introspection path (default: /services/auth/api/V2/token)
    pub token_path: Option<String>,

    /// Logout path (default: /services/auth/logout)
    pub logout_path: Option<String>,

    /// Login page path (default: /login)
    pub login_path: Option<String>,

    /// Where login should send the user back to
    pub return_url: Option<String>,

    /// Per-request timeout
    pub request_timeout_seconds: Option<u64>,
}

/// Credential lookup settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCredentialConfig {
    /// Environment variable holding the token (default: KB_AUTH_TOKEN)
    pub env_var: Option<String>,

    /// File containing a `Cookie:` header value (`name=value; name2=value2`)
    pub cookie_file: Option<PathBuf>,

    /// Cookie names to look for, in order
    pub cookie_names: Option<Vec<String>>,
}

/// Timing settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTimingConfig {
    /// How long before expiry the warning appears
    pub warning_lead_seconds: Option<u64>,

    /// How long a dismissed warning stays hidden
    pub cooldown_seconds: Option<u64>,

    /// Background poll interval
    pub poll_interval_seconds: Option<u64>,

    /// Extra attempts after a failed fetch
    pub retry_attempts: Option<u32>,

    /// Delay between fetch attempts
    pub retry_delay_ms: Option<u64>,
}

/// Navigation settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawNavigationConfig {
    /// Program (and leading args) used to open the login URL, e.g. ["xdg-open"]
    pub open_command: Option<Vec<String>>,
}
