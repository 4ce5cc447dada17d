//! Key-value backends that hold throttle buckets.
//!
//! A store only needs single-key reads and TTL writes. A missing or expired
//! entry is reported as `Ok(None)`; every other failure is an error.

pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use crate::bucket::Bucket;
use crate::error::ThrottlerResult;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Read the bucket at `key`, `None` if it does not exist
    async fn get(&self, key: &str) -> ThrottlerResult<Option<Bucket>>;

    /// Write `bucket` at `key`, expiring after `ttl`
    async fn put(&self, key: &str, bucket: &Bucket, ttl: Duration) -> ThrottlerResult<()>;

    /// Check that the backend is reachable
    async fn ping(&self) -> ThrottlerResult<()> {
        Ok(())
    }

    /// Short backend name used in health reports
    fn name(&self) -> &'static str;
}

