use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Persisted token bucket for one throttle key.
///
/// `created` marks the start of the current window in milliseconds since the
/// Unix epoch; `tokens` is what is left in that window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub created: u64,
    pub tokens: u64,
}

impl Bucket {
    /// A full bucket whose window starts at `now`.
    pub fn new(limit: u64, now: u64) -> Self {
        Self {
            created: now,
            tokens: limit,
        }
    }

    /// Same window, one token fewer. Never goes below zero.
    pub fn consume(&self) -> Self {
        Self {
            created: self.created,
            tokens: self.tokens.saturating_sub(1),
        }
    }

    /// Milliseconds left in the window, or `None` once it has elapsed.
    ///
    /// A `created` timestamp ahead of `now` (clock skew) is treated as a window
    /// that just started, so the result never exceeds `ttl`.
    pub fn remaining_ttl(&self, ttl: u64, now: u64) -> Option<u64> {
        let elapsed = now.saturating_sub(self.created);
        match ttl.checked_sub(elapsed) {
            Some(0) | None => None,
            Some(remaining) => Some(remaining),
        }
    }
}

/// Current wall clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
