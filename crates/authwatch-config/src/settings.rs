//! Validated settings structures

use crate::schema::{
    RawAuthConfig, RawConfig, RawCredentialConfig, RawNavigationConfig, RawTimingConfig,
};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ORIGIN: &str = "https://ci.kbase.us";
pub const DEFAULT_TOKEN_PATH: &str = "/services/auth/api/V2/token";
pub const DEFAULT_LOGOUT_PATH: &str = "/services/auth/logout";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_CREDENTIAL_ENV_VAR: &str = "KB_AUTH_TOKEN";
pub const DEFAULT_COOKIE_NAMES: [&str; 2] = ["kbase_session", "kbase_session_backup"];

/// Warning shows 5 minutes before expiration
pub const DEFAULT_WARNING_LEAD: Duration = Duration::from_secs(5 * 60);
/// After dismissing, the warning returns after 1 minute
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Validated settings ready for use by the daemon
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub auth: AuthSettings,
    pub credential: CredentialSettings,
    pub timing: TimingPolicy,
    pub navigation: NavigationSettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            auth: AuthSettings::from_raw(raw.auth),
            credential: CredentialSettings::from_raw(raw.credential),
            timing: TimingPolicy::from_raw(raw.timing),
            navigation: NavigationSettings::from_raw(raw.navigation),
        }
    }
}

/// Auth service endpoints
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub origin: String,
    pub token_path: String,
    pub logout_path: String,
    pub login_path: String,
    /// `None` sends the user back to the origin itself
    pub return_url: Option<String>,
    pub request_timeout: Duration,
}

impl AuthSettings {
    fn from_raw(raw: RawAuthConfig) -> Self {
        Self {
            origin: raw
                .origin
                .map(|o| o.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_ORIGIN.into()),
            token_path: raw.token_path.unwrap_or_else(|| DEFAULT_TOKEN_PATH.into()),
            logout_path: raw.logout_path.unwrap_or_else(|| DEFAULT_LOGOUT_PATH.into()),
            login_path: raw.login_path.unwrap_or_else(|| DEFAULT_LOGIN_PATH.into()),
            return_url: raw.return_url,
            request_timeout: raw
                .request_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self::from_raw(RawAuthConfig::default())
    }
}

/// Where the local credential lives
#[derive(Debug, Clone)]
pub struct CredentialSettings {
    pub env_var: String,
    pub cookie_file: Option<PathBuf>,
    pub cookie_names: Vec<String>,
}

impl CredentialSettings {
    fn from_raw(raw: RawCredentialConfig) -> Self {
        Self {
            env_var: raw
                .env_var
                .unwrap_or_else(|| DEFAULT_CREDENTIAL_ENV_VAR.into()),
            cookie_file: raw.cookie_file,
            cookie_names: raw.cookie_names.unwrap_or_else(|| {
                DEFAULT_COOKIE_NAMES.iter().map(|n| n.to_string()).collect()
            }),
        }
    }
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self::from_raw(RawCredentialConfig::default())
    }
}

/// Timing knobs of the expiration monitor
///
/// Read once at startup; a running monitor never sees them change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingPolicy {
    /// How long before expiry the warning becomes due
    pub warning_lead: Duration,
    /// How long a dismissed warning stays away
    pub cooldown: Duration,
    /// Background poll interval
    pub poll_interval: Duration,
    /// Extra fetch attempts after a retryable failure
    pub retry_attempts: u32,
    /// Fixed delay between fetch attempts
    pub retry_delay: Duration,
}

impl TimingPolicy {
    fn from_raw(raw: RawTimingConfig) -> Self {
        let defaults = Self::default();
        Self {
            warning_lead: raw
                .warning_lead_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.warning_lead),
            cooldown: raw
                .cooldown_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.cooldown),
            poll_interval: raw
                .poll_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            retry_attempts: raw.retry_attempts.unwrap_or(defaults.retry_attempts),
            retry_delay: raw
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
        }
    }

    pub fn warning_lead_ms(&self) -> i64 {
        i64::try_from(self.warning_lead.as_millis()).unwrap_or(i64::MAX)
    }

    pub fn cooldown_ms(&self) -> i64 {
        i64::try_from(self.cooldown.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            warning_lead: DEFAULT_WARNING_LEAD,
            cooldown: DEFAULT_COOLDOWN,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// How the login URL is handed to the user
#[derive(Debug, Clone, Default)]
pub struct NavigationSettings {
    /// Program plus leading arguments; the URL is appended. `None` only
    /// prints the URL.
    pub open_command: Option<Vec<String>>,
}

impl NavigationSettings {
    fn from_raw(raw: RawNavigationConfig) -> Self {
        Self {
            open_command: raw.open_command.filter(|argv| !argv.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.auth.origin, "https://ci.kbase.us");
        assert_eq!(settings.auth.token_path, "/services/auth/api/V2/token");
        assert_eq!(settings.credential.env_var, "KB_AUTH_TOKEN");
        assert_eq!(
            settings.credential.cookie_names,
            vec!["kbase_session", "kbase_session_backup"]
        );
        assert_eq!(settings.timing.warning_lead, Duration::from_secs(300));
        assert_eq!(settings.timing.cooldown, Duration::from_secs(60));
        assert_eq!(settings.timing.poll_interval, Duration::from_secs(30));
        assert_eq!(settings.timing.retry_attempts, 2);
        assert_eq!(settings.timing.retry_delay, Duration::from_secs(1));
        assert!(settings.navigation.open_command.is_none());
    }

    #[test]
    fn origin_loses_trailing_slash() {
        let auth = AuthSettings::from_raw(RawAuthConfig {
            origin: Some("https://kbase.us/".into()),
            ..Default::default()
        });
        assert_eq!(auth.origin, "https://kbase.us");
    }

    #[test]
    fn timing_millis_helpers() {
        let timing = TimingPolicy::default();
        assert_eq!(timing.warning_lead_ms(), 300_000);
        assert_eq!(timing.cooldown_ms(), 60_000);

        let huge = TimingPolicy {
            warning_lead: Duration::MAX,
            cooldown: Duration::from_secs(u64::MAX),
            ..TimingPolicy::default()
        };
        assert_eq!(huge.warning_lead_ms(), i64::MAX);
        assert_eq!(huge.cooldown_ms(), i64::MAX);
    }

    #[test]
    fn empty_open_command_means_print_only() {
        let nav = NavigationSettings::from_raw(RawNavigationConfig {
            open_command: Some(vec![]),
        });
        assert!(nav.open_command.is_none());
    }
}
