use crate::throttler::{BucketAction, ThrottleOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

/// Keys tracked at once before the least recently seen one is folded away
pub const DEFAULT_MAX_TRACKED_KEYS: usize = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThrottleMetrics {
    pub total_requests: u64,
    pub allowed_requests: u64,
    pub throttled_requests: u64,
    pub bucket_resets: u64,
    pub store_errors: u64,
    pub last_request: u64,
}

impl ThrottleMetrics {
    fn absorb(&mut self, other: &ThrottleMetrics) {
        self.total_requests += other.total_requests;
        self.allowed_requests += other.allowed_requests;
        self.throttled_requests += other.throttled_requests;
        self.bucket_resets += other.bucket_resets;
        self.store_errors += other.store_errors;
        self.last_request = self.last_request.max(other.last_request);
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Debug, Default)]
struct Tracked {
    metrics: ThrottleMetrics,
    last_seen: u64,
}

#[derive(Debug, Default)]
struct Registry {
    keys: HashMap<String, Tracked>,
    // Totals of keys evicted from `keys`, still part of the global view
    retired: ThrottleMetrics,
    sequence: u64,
}

/// Per throttle key counters, kept in process memory.
///
/// At most `max_keys` keys are tracked individually. When a new key arrives
/// at the cap, the least recently seen key is evicted and its counts move
/// into the global totals.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    registry: Arc<RwLock<Registry>>,
    max_keys: usize,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::with_max_keys(DEFAULT_MAX_TRACKED_KEYS)
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_keys(max_keys: usize) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            max_keys: max_keys.max(1),
        }
    }

    async fn update<F: FnOnce(&mut ThrottleMetrics)>(&self, key: &str, apply: F) {
        let mut registry = self.registry.write().await;
        registry.sequence += 1;
        let sequence = registry.sequence;

        if !registry.keys.contains_key(key) && registry.keys.len() >= self.max_keys {
            let oldest = registry
                .keys
                .iter()
                .min_by_key(|(_, tracked)| tracked.last_seen)
                .map(|(oldest, _)| oldest.clone());
            if let Some(oldest) = oldest {
                if let Some(evicted) = registry.keys.remove(&oldest) {
                    registry.retired.absorb(&evicted.metrics);
                }
            }
        }

        let tracked = registry.keys.entry(key.to_string()).or_default();
        tracked.last_seen = sequence;
        tracked.metrics.total_requests += 1;
        tracked.metrics.last_request = now_secs();
        apply(&mut tracked.metrics);
    }

    pub async fn record_outcome(&self, key: &str, outcome: &ThrottleOutcome) {
        self.update(key, |entry| {
            if outcome.tokens > 0 {
                entry.allowed_requests += 1;
            } else {
                entry.throttled_requests += 1;
            }
            if outcome.action == BucketAction::Reset {
                entry.bucket_resets += 1;
            }
        })
        .await;
    }

    pub async fn record_error(&self, key: &str) {
        self.update(key, |entry| entry.store_errors += 1).await;
    }

    pub async fn get_key_metrics(&self, key: &str) -> Option<ThrottleMetrics> {
        let registry = self.registry.read().await;
        registry.keys.get(key).map(|tracked| tracked.metrics.clone())
    }

    pub async fn get_global_metrics(&self) -> ThrottleMetrics {
        let registry = self.registry.read().await;
        let mut global = registry.retired.clone();
        for tracked in registry.keys.values() {
            global.absorb(&tracked.metrics);
        }
        global
    }

    pub async fn tracked_keys(&self) -> usize {
        self.registry.read().await.keys.len()
    }
}
