//! Expiration time math
//!
//! Everything here is a pure function of its arguments: no timers, no I/O.

use authwatch_api::DismissalRecord;

/// Phase a token is in at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Valid,
    Warning,
    Blocked,
}

/// Result of classifying a token against the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub phase: Phase,
    /// Milliseconds until the next instant at which the phase can change.
    /// `None` once blocked.
    pub next_check_delay_ms: Option<i64>,
}

/// Classify a token expiring at `expires_at_ms` as seen at `now_ms`.
///
/// The warning window opens `warning_lead_ms` before expiry. A dismissal
/// pushes the window start out to the end of its cooldown. For `Valid`, the
/// next check is the earlier of that window start and the expiry itself; for
/// `Warning`, it is the expiry.
pub fn classify(
    now_ms: i64,
    expires_at_ms: i64,
    dismissal: Option<DismissalRecord>,
    warning_lead_ms: i64,
    cooldown_ms: i64,
) -> Classification {
    if now_ms >= expires_at_ms {
        return Classification {
            phase: Phase::Blocked,
            next_check_delay_ms: None,
        };
    }

    let warning_start = expires_at_ms.saturating_sub(warning_lead_ms);
    let next_warning_start = match dismissal {
        Some(record) => warning_start.max(record.cooldown_end_ms(cooldown_ms)),
        None => warning_start,
    };

    if now_ms >= next_warning_start {
        Classification {
            phase: Phase::Warning,
            next_check_delay_ms: Some(expires_at_ms - now_ms),
        }
    } else {
        Classification {
            phase: Phase::Valid,
            next_check_delay_ms: Some(next_warning_start.min(expires_at_ms) - now_ms),
        }
    }
}

/// Whole minutes left before expiry, rounded up and never below 1
pub fn minutes_left(now_ms: i64, expires_at_ms: i64) -> u64 {
    let remaining = expires_at_ms.saturating_sub(now_ms);
    if remaining <= 0 {
        return 1;
    }
    let minutes = (remaining as u64).div_ceil(60_000);
    minutes.max(1)
}
