//! Token and monitor state types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Snapshot of the latest known credential state
///
/// Replaced wholesale on every successful poll; never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Expiry as unix milliseconds
    pub expires_at_ms: i64,
    /// Account the token belongs to
    pub subject: String,
    /// Creation time as unix milliseconds
    pub issued_at_ms: i64,
}

impl TokenInfo {
    pub fn new(subject: impl Into<String>, issued_at_ms: i64, expires_at_ms: i64) -> Self {
        Self {
            expires_at_ms,
            subject: subject.into(),
            issued_at_ms,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Milliseconds until expiry (negative once expired)
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.expires_at_ms - now_ms
    }
}

/// Response body of the Auth2 `/api/V2/token` endpoint
///
/// Only `expires` and `user` matter to the monitor; the rest is accepted so
/// that a well-formed response never fails to decode.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTokenInfo {
    pub expires: i64,
    pub user: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub custom: HashMap<String, String>,
    #[serde(default)]
    pub cachefor: Option<i64>,
}

/// Why an Auth2 response could not be turned into a `TokenInfo`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenDecodeError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("expiry timestamp {0} is not positive")]
    InvalidExpiry(i64),

    #[error("token has no user")]
    MissingUser,
}

impl TryFrom<RawTokenInfo> for TokenInfo {
    type Error = TokenDecodeError;

    fn try_from(raw: RawTokenInfo) -> Result<Self, Self::Error> {
        if raw.expires <= 0 {
            return Err(TokenDecodeError::InvalidExpiry(raw.expires));
        }
        if raw.user.trim().is_empty() {
            return Err(TokenDecodeError::MissingUser);
        }

        Ok(TokenInfo {
            expires_at_ms: raw.expires,
            subject: raw.user,
            issued_at_ms: raw.created,
        })
    }
}

impl TokenInfo {
    /// Decode an Auth2 token response body
    pub fn from_auth2_json(body: &str) -> Result<Self, TokenDecodeError> {
        let raw: RawTokenInfo = serde_json::from_str(body)
            .map_err(|e| TokenDecodeError::InvalidJson(e.to_string()))?;
        TokenInfo::try_from(raw)
    }
}

/// State of an expiration monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    /// Waiting for the first token fetch
    Checking,
    /// Token is valid and outside the warning window
    Valid,
    /// Warning dialog is being shown
    Warning,
    /// Terminal: the user must re-authenticate
    Blocked,
}

impl MonitorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MonitorState::Blocked)
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MonitorState::Checking => "checking",
            MonitorState::Valid => "valid",
            MonitorState::Warning => "warning",
            MonitorState::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// Record of the user dismissing the warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissalRecord {
    pub dismissed_at_ms: i64,
}

impl DismissalRecord {
    pub fn at(dismissed_at_ms: i64) -> Self {
        Self { dismissed_at_ms }
    }

    /// Instant at which the warning may reappear
    pub fn cooldown_end_ms(&self, cooldown_ms: i64) -> i64 {
        self.dismissed_at_ms.saturating_add(cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_auth2_response() {
        let body = r#"{
            "type": "Login",
            "id": "3b8ac4a4-2d1c-4c43-9e3a-5bd5f5f5b5c1",
            "expires": 1766673000000,
            "created": 1766068200000,
            "name": null,
            "user": "alice",
            "custom": {},
            "cachefor": 300000
        }"#;

        let info = TokenInfo::from_auth2_json(body).unwrap();
        assert_eq!(info.subject, "alice");
        assert_eq!(info.expires_at_ms, 1_766_673_000_000);
        assert_eq!(info.issued_at_ms, 1_766_068_200_000);
    }

    #[test]
    fn decode_minimal_response() {
        let info = TokenInfo::from_auth2_json(r#"{"expires": 5000, "user": "bob"}"#).unwrap();
        assert_eq!(info, TokenInfo::new("bob", 0, 5000));
    }

    #[test]
    fn decode_rejects_missing_expiry() {
        let err = TokenInfo::from_auth2_json(r#"{"user": "bob"}"#).unwrap_err();
        assert!(matches!(err, TokenDecodeError::InvalidJson(_)));
    }

    #[test]
    fn decode_rejects_bad_values() {
        let err = TokenInfo::from_auth2_json(r#"{"expires": 0, "user": "bob"}"#).unwrap_err();
        assert_eq!(err, TokenDecodeError::InvalidExpiry(0));

        let err = TokenInfo::from_auth2_json(r#"{"expires": 10, "user": "  "}"#).unwrap_err();
        assert_eq!(err, TokenDecodeError::MissingUser);
    }

    #[test]
    fn token_expiry_checks() {
        let info = TokenInfo::new("alice", 0, 1_000);
        assert!(!info.is_expired(999));
        assert!(info.is_expired(1_000));
        assert_eq!(info.remaining_ms(400), 600);
        assert_eq!(info.remaining_ms(1_400), -400);
    }

    #[test]
    fn monitor_state_serializes_snake_case() {
        let json = serde_json::to_string(&MonitorState::Blocked).unwrap();
        assert_eq!(json, "\"blocked\"");
        assert!(MonitorState::Blocked.is_terminal());
        assert!(!MonitorState::Warning.is_terminal());
    }
}
