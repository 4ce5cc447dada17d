use crate::bucket::{now_millis, Bucket};
use crate::error::{ThrottlerError, ThrottlerResult};
use crate::key_generator::KeyGenerator;
use crate::store::BucketStore;
use crate::validation::RequestValidator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Per-call overrides. Unset fields fall back to the throttler defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleOptions {
    pub limit: Option<u64>,
    /// Window length in milliseconds
    pub ttl: Option<u64>,
}

impl ThrottleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn ttl(mut self, ttl_ms: u64) -> Self {
        self.ttl = Some(ttl_ms);
        self
    }
}

/// What happened to the bucket on a throttle call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketAction {
    /// No bucket existed, a full one was written
    Created,
    /// The window was still open, one token was taken
    Consumed,
    /// The window had elapsed, the bucket was refilled
    Reset,
}

/// Result of a single throttle call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleOutcome {
    pub tokens: u64,
    pub limit: u64,
    pub action: BucketAction,
    /// Time until the bucket refills
    pub resets_in: Duration,
}

/// Collects the four mandatory settings of a [`Throttler`]
#[derive(Default)]
pub struct ThrottlerBuilder {
    store: Option<Arc<dyn BucketStore>>,
    namespace: Option<String>,
    limit: Option<u64>,
    ttl: Option<u64>,
}

impl ThrottlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a JSON object carrying `namespace`, `limit` and `ttl`.
    ///
    /// Absent fields stay unset and are reported by [`ThrottlerBuilder::build`];
    /// present `limit`/`ttl` values must be non-negative integers.
    pub fn from_value(config: &Value) -> ThrottlerResult<Self> {
        let object = config
            .as_object()
            .ok_or_else(|| ThrottlerError::Configuration("must initialize with config".into()))?;

        let mut builder = Self::new();
        if let Some(namespace) = object.get("namespace") {
            let namespace = namespace.as_str().ok_or_else(|| {
                ThrottlerError::Configuration("`namespace` must be a string".into())
            })?;
            builder.namespace = Some(namespace.to_string());
        }
        builder.limit = RequestValidator::number_field(object, "limit")?;
        builder.ttl = RequestValidator::number_field(object, "ttl")?;
        Ok(builder)
    }

    pub fn store<S: BucketStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<dyn BucketStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Window length in milliseconds
    pub fn ttl(mut self, ttl_ms: u64) -> Self {
        self.ttl = Some(ttl_ms);
        self
    }

    pub fn build(self) -> ThrottlerResult<Throttler> {
        let store = self.store.ok_or_else(|| ThrottlerError::missing_field("store"))?;
        let limit = self.limit.ok_or_else(|| ThrottlerError::missing_field("limit"))?;
        let namespace = self
            .namespace
            .ok_or_else(|| ThrottlerError::missing_field("namespace"))?;
        let ttl = self.ttl.ok_or_else(|| ThrottlerError::missing_field("ttl"))?;

        Ok(Throttler {
            store,
            keys: KeyGenerator::new(&namespace),
            namespace,
            limit,
            ttl,
        })
    }
}

/// Token bucket throttling over a [`BucketStore`].
///
/// Each call is one read-modify-write cycle on the bucket of its key. The
/// cycle is not atomic: concurrent calls for the same key can read the same
/// bucket and one of their decrements is lost.
#[derive(Clone)]
pub struct Throttler {
    store: Arc<dyn BucketStore>,
    keys: KeyGenerator,
    namespace: String,
    limit: u64,
    ttl: u64,
}

impl Throttler {
    pub fn builder() -> ThrottlerBuilder {
        ThrottlerBuilder::new()
    }

    /// Throttle `key` with the default limit and window
    pub async fn throttle(&self, key: &str) -> ThrottlerResult<u64> {
        self.throttle_with(key, ThrottleOptions::default()).await
    }

    /// Throttle `key`, returning the tokens left in its bucket
    pub async fn throttle_with(
        &self,
        key: &str,
        options: ThrottleOptions,
    ) -> ThrottlerResult<u64> {
        self.check(key, options).await.map(|outcome| outcome.tokens)
    }

    /// Throttle `key` and report how the bucket changed
    pub async fn check(
        &self,
        key: &str,
        options: ThrottleOptions,
    ) -> ThrottlerResult<ThrottleOutcome> {
        let limit = options.limit.unwrap_or(self.limit);
        let ttl = options.ttl.unwrap_or(self.ttl);
        let storage_key = self.keys.generate_key(key);

        let current = self.store.get(&storage_key).await?;
        let now = now_millis();

        let (bucket, expiry, action) = match current {
            None => (Bucket::new(limit, now), ttl, BucketAction::Created),
            Some(existing) => match existing.remaining_ttl(ttl, now) {
                Some(remaining) => (existing.consume(), remaining, BucketAction::Consumed),
                None => (Bucket::new(limit, now), ttl, BucketAction::Reset),
            },
        };

        debug!(
            key = %storage_key,
            action = ?action,
            tokens = bucket.tokens,
            expiry_ms = expiry,
            "Writing bucket"
        );

        self.store
            .put(&storage_key, &bucket, Duration::from_millis(expiry))
            .await?;

        Ok(ThrottleOutcome {
            tokens: bucket.tokens,
            limit,
            action,
            resets_in: Duration::from_millis(expiry),
        })
    }

    /// Storage key used for `key`
    pub fn storage_key(&self, key: &str) -> String {
        self.keys.generate_key(key)
    }

    pub fn store(&self) -> &Arc<dyn BucketStore> {
        &self.store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Default window length in milliseconds
    pub fn ttl(&self) -> u64 {
        self.ttl
    }
}

impl fmt::Debug for Throttler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttler")
            .field("store", &self.store.name())
            .field("namespace", &self.namespace)
            .field("limit", &self.limit)
            .field("ttl", &self.ttl)
            .finish()
    }
}
