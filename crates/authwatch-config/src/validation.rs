//! Configuration validation

use crate::schema::{RawAuthConfig, RawConfig, RawCredentialConfig, RawTimingConfig};
use thiserror::Error;
use url::Url;

/// Upper bound on `timing.retry_attempts`
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Upper bound on the warning lead, cooldown and poll interval (one day)
pub const MAX_TIMING_SECONDS: u64 = 24 * 60 * 60;

/// Upper bound on `timing.retry_delay_ms` (one minute)
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Upper bound on `auth.request_timeout_seconds`
pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 300;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}': {message}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        message: String,
    },

    #[error("{field}: path '{value}' must start with '/'")]
    RelativePath { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field} = {value} exceeds the maximum of {max}")]
    TooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("timing.retry_attempts = {attempts} exceeds the maximum of {max}")]
    TooManyRetries { attempts: u32, max: u32 },

    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_auth(&config.auth));
    errors.extend(validate_credential(&config.credential));
    errors.extend(validate_timing(&config.timing));

    if let Some(argv) = &config.navigation.open_command
        && argv.first().is_some_and(|program| program.trim().is_empty())
    {
        errors.push(ValidationError::Empty {
            field: "navigation.open_command[0]",
        });
    }

    errors
}

fn validate_auth(auth: &RawAuthConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(origin) = &auth.origin
        && let Err(message) = check_http_url(origin)
    {
        errors.push(ValidationError::InvalidUrl {
            field: "auth.origin",
            value: origin.clone(),
            message,
        });
    }

    if let Some(return_url) = &auth.return_url
        && let Err(message) = check_http_url(return_url)
    {
        errors.push(ValidationError::InvalidUrl {
            field: "auth.return_url",
            value: return_url.clone(),
            message,
        });
    }

    for (field, path) in [
        ("auth.token_path", &auth.token_path),
        ("auth.logout_path", &auth.logout_path),
        ("auth.login_path", &auth.login_path),
    ] {
        if let Some(path) = path
            && !path.starts_with('/')
        {
            errors.push(ValidationError::RelativePath {
                field,
                value: path.clone(),
            });
        }
    }

    match auth.request_timeout_seconds {
        Some(0) => errors.push(ValidationError::ZeroDuration {
            field: "auth.request_timeout_seconds",
        }),
        Some(value) if value > MAX_REQUEST_TIMEOUT_SECONDS => {
            errors.push(ValidationError::TooLarge {
                field: "auth.request_timeout_seconds",
                value,
                max: MAX_REQUEST_TIMEOUT_SECONDS,
            })
        }
        _ => {}
    }

    errors
}

fn validate_credential(credential: &RawCredentialConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(var) = &credential.env_var
        && var.trim().is_empty()
    {
        errors.push(ValidationError::Empty {
            field: "credential.env_var",
        });
    }

    if let Some(names) = &credential.cookie_names {
        if names.is_empty() {
            errors.push(ValidationError::Empty {
                field: "credential.cookie_names",
            });
        } else if names.iter().any(|n| n.trim().is_empty()) {
            errors.push(ValidationError::Empty {
                field: "credential.cookie_names[]",
            });
        }
    }

    errors
}

fn validate_timing(timing: &RawTimingConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("timing.warning_lead_seconds", timing.warning_lead_seconds),
        ("timing.cooldown_seconds", timing.cooldown_seconds),
        ("timing.poll_interval_seconds", timing.poll_interval_seconds),
    ] {
        match value {
            Some(0) => errors.push(ValidationError::ZeroDuration { field }),
            Some(value) if value > MAX_TIMING_SECONDS => errors.push(ValidationError::TooLarge {
                field,
                value,
                max: MAX_TIMING_SECONDS,
            }),
            _ => {}
        }
    }

    if let Some(delay) = timing.retry_delay_ms
        && delay > MAX_RETRY_DELAY_MS
    {
        errors.push(ValidationError::TooLarge {
            field: "timing.retry_delay_ms",
            value: delay,
            max: MAX_RETRY_DELAY_MS,
        });
    }

    if let Some(attempts) = timing.retry_attempts
        && attempts > MAX_RETRY_ATTEMPTS
    {
        errors.push(ValidationError::TooManyRetries {
            attempts,
            max: MAX_RETRY_ATTEMPTS,
        });
    }

    errors
}

/// Check that `value` is an absolute http(s) URL
fn check_http_url(value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawNavigationConfig, RawTimingConfig};

    fn empty_config() -> RawConfig {
        RawConfig {
            config_version: 1,
            auth: Default::default(),
            credential: Default::default(),
            timing: Default::default(),
            navigation: Default::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&empty_config()).is_empty());
    }

    #[test]
    fn rejects_bad_origin() {
        let mut config = empty_config();
        config.auth.origin = Some("ftp://kbase.us".into());
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::InvalidUrl { field: "auth.origin", .. }
        ));

        config.auth.origin = Some("kbase.us".into());
        assert_eq!(validate_config(&config).len(), 1);
    }

    #[test]
    fn rejects_relative_paths() {
        let mut config = empty_config();
        config.auth.login_path = Some("login".into());
        let errors = validate_config(&config);
        assert!(matches!(
            &errors[0],
            ValidationError::RelativePath { field: "auth.login_path", .. }
        ));
    }

    #[test]
    fn rejects_zero_intervals_and_too_many_retries() {
        let mut config = empty_config();
        config.timing = RawTimingConfig {
            warning_lead_seconds: Some(0),
            cooldown_seconds: Some(0),
            poll_interval_seconds: Some(0),
            retry_attempts: Some(50),
            retry_delay_ms: Some(0),
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::TooManyRetries { attempts: 50, .. })));
    }

    #[test]
    fn rejects_oversized_timing() {
        let mut config = empty_config();
        config.timing = RawTimingConfig {
            warning_lead_seconds: Some(MAX_TIMING_SECONDS + 1),
            cooldown_seconds: Some(u64::MAX),
            poll_interval_seconds: Some(9_223_372_036_854_775_807),
            retry_attempts: None,
            retry_delay_ms: Some(MAX_RETRY_DELAY_MS + 1),
        };
        config.auth.request_timeout_seconds = Some(MAX_REQUEST_TIMEOUT_SECONDS + 1);

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::TooLarge { .. })));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::TooLarge { field: "timing.poll_interval_seconds", .. }
        )));
    }

    #[test]
    fn accepts_timing_at_the_limits() {
        let mut config = empty_config();
        config.timing = RawTimingConfig {
            warning_lead_seconds: Some(MAX_TIMING_SECONDS),
            cooldown_seconds: Some(MAX_TIMING_SECONDS),
            poll_interval_seconds: Some(MAX_TIMING_SECONDS),
            retry_attempts: Some(MAX_RETRY_ATTEMPTS),
            retry_delay_ms: Some(MAX_RETRY_DELAY_MS),
        };
        config.auth.request_timeout_seconds = Some(MAX_REQUEST_TIMEOUT_SECONDS);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn rejects_empty_cookie_names() {
        let mut config = empty_config();
        config.credential.cookie_names = Some(vec![]);
        assert_eq!(validate_config(&config).len(), 1);

        config.credential.cookie_names = Some(vec!["kbase_session".into(), " ".into()]);
        assert_eq!(validate_config(&config).len(), 1);
    }

    #[test]
    fn rejects_blank_open_command() {
        let mut config = empty_config();
        config.navigation = RawNavigationConfig {
            open_command: Some(vec!["".into(), "--new-tab".into()]),
        };
        assert_eq!(validate_config(&config).len(), 1);
    }
}
