use super::BucketStore;
use crate::bucket::Bucket;
use crate::error::ThrottlerResult;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;
use std::time::Duration;

/// Buckets stored as JSON strings with a millisecond expiry (`SET .. PX`).
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> ThrottlerResult<Self> {
        let client = Client::open(redis_url)?;
        let connection = client.get_multiplexed_tokio_connection().await?;
        Ok(Self { connection })
    }

    /// Redis rejects `PX 0`, so a zero TTL becomes the shortest expiry it accepts.
    fn expiry_millis(ttl: Duration) -> u64 {
        (ttl.as_millis() as u64).max(1)
    }
}

#[async_trait]
impl BucketStore for RedisStore {
    async fn get(&self, key: &str) -> ThrottlerResult<Option<Bucket>> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        match raw {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, bucket: &Bucket, ttl: Duration) -> ThrottlerResult<()> {
        let payload = serde_json::to_string(bucket)?;
        let mut conn = self.connection.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("PX")
            .arg(Self::expiry_millis(ttl))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> ThrottlerResult<()> {
        let mut conn = self.connection.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThrottlerError;

    #[test]
    fn test_expiry_millis() {
        assert_eq!(RedisStore::expiry_millis(Duration::from_millis(40)), 40);
        assert_eq!(RedisStore::expiry_millis(Duration::ZERO), 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let result = RedisStore::connect("not a url").await;
        assert!(matches!(result, Err(ThrottlerError::Store(_))));
    }
}
