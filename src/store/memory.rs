use super::BucketStore;
use crate::bucket::Bucket;
use crate::error::ThrottlerResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    bucket: Bucket,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Ordered in-process store with per-entry TTL.
///
/// Expired entries are invisible to reads straight away. They are physically
/// dropped by [`MemoryStore::purge_expired`], which a server runs periodically
/// through [`MemoryStore::spawn_purge_task`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry, returning how many were dropped
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let initial_count = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        initial_count - entries.len()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| !entry.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Purge expired entries every `every` until the runtime shuts down
    pub fn spawn_purge_task(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "Purged expired buckets");
                }
            }
        })
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn get(&self, key: &str) -> ThrottlerResult<Option<Bucket>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.bucket))
    }

    async fn put(&self, key: &str, bucket: &Bucket, ttl: Duration) -> ThrottlerResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                bucket: *bucket,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new();
        let bucket = Bucket::new(3, 100);
        store
            .put("ns:throttle:a", &bucket, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("ns:throttle:a").await.unwrap(), Some(bucket));
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let store = MemoryStore::new();
        let bucket = Bucket::new(3, 100);
        store.put("k", &bucket, Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.purge_expired().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_immediately_expired() {
        let store = MemoryStore::new();
        store.put("k", &Bucket::new(3, 0), Duration::ZERO).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_are_ordered() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        for key in ["c", "a", "b"] {
            store.put(key, &Bucket::new(1, 0), ttl).await.unwrap();
        }
        let keys: Vec<String> = store.entries.read().await.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_purge_task_frees_expired_entries() {
        let store = MemoryStore::new();
        for i in 0..1_000 {
            store
                .put(&format!("key-{}", i), &Bucket::new(1, 0), Duration::from_millis(1))
                .await
                .unwrap();
        }
        store
            .put("long-lived", &Bucket::new(1, 0), Duration::from_secs(60))
            .await
            .unwrap();

        let task = store.spawn_purge_task(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        assert_eq!(store.entries.read().await.len(), 1);
        assert_eq!(store.len().await, 1);
    }
}
