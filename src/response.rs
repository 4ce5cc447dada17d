use crate::metrics::ThrottleMetrics;
use crate::throttler::{BucketAction, ThrottleOutcome, Throttler};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct ThrottleResponse {
    pub key: String,
    pub allowed: bool,
    pub remaining: u64,
    pub limit: u64,
    pub action: BucketAction,
    pub reset_after_ms: u64,
}

impl ThrottleResponse {
    pub fn from_outcome(key: String, outcome: &ThrottleOutcome) -> Self {
        Self {
            key,
            allowed: outcome.tokens > 0,
            remaining: outcome.tokens,
            limit: outcome.limit,
            action: outcome.action,
            reset_after_ms: outcome.resets_in.as_millis() as u64,
        }
    }
}

/// Defaults the throttler was started with
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub namespace: String,
    pub limit: u64,
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    pub store: String,
}

impl ConfigResponse {
    pub fn current(throttler: &Throttler) -> Self {
        Self {
            namespace: throttler.namespace().to_string(),
            limit: throttler.limit(),
            window: Duration::from_millis(throttler.ttl()),
            store: throttler.store().name().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub tracked_keys: usize,
    pub global: ThrottleMetrics,
}
