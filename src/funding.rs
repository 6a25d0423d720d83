// src/funding.rs
use chrono::{DateTime, Utc};

pub const FUNDING_NOW: &str = "Funding now";
pub const UNKNOWN: &str = "unknown";
/// Minutes reported when the funding instant is unknown. Large enough that
/// no lead-time comparison can fire on it.
pub const UNKNOWN_MINUTES: i64 = i64::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub label: String,
    pub minutes: i64, // negative when overdue
}

/// Time left until `next_funding_at` as seen from `now`.
pub fn countdown(next_funding_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Countdown {
    let Some(at) = next_funding_at else {
        return Countdown { label: UNKNOWN.to_string(), minutes: UNKNOWN_MINUTES };
    };
    let delta = at - now;
    let minutes = delta.num_minutes(); // truncates toward zero
    let secs = delta.num_seconds();
    let label = if secs <= 0 {
        FUNDING_NOW.to_string()
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    };
    Countdown { label, minutes }
}
