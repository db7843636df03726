use super::StorageDriver;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::record::RawRecord;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Key prefix used when none is configured
pub(crate) const DEFAULT_PREFIX: &str = "mneme:storage:";

/// Redis-backed driver
///
/// Each identity is stored as one string holding a JSON array.
///
/// # Security Features
///
/// - Keys are prefixed to isolate from other Redis data
/// - Optional TTL-based expiration
/// - Consider enabling Redis AUTH and TLS in production
pub struct RedisDriver {
    client: redis::Client,
    /// Key prefix
    prefix: String,
    /// TTL in seconds (no expiry when unset)
    ttl_seconds: Option<u64>,
}

impl RedisDriver {
    /// Create a new Redis driver
    ///
    /// # Errors
    ///
    /// Returns error if Redis URL is invalid
    pub fn new(redis_url: &str) -> Result<Self> {
        Self::with_options(redis_url, DEFAULT_PREFIX, None)
    }

    /// Create with custom prefix and TTL
    ///
    /// # Errors
    ///
    /// Returns error if Redis URL is invalid
    pub fn with_options(redis_url: &str, prefix: &str, ttl_seconds: Option<u64>) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Configuration(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            prefix: prefix.to_string(),
            ttl_seconds,
        })
    }

    /// Build the full Redis key
    fn build_key(&self, identity: &Identity) -> String {
        format!("{}{}", self.prefix, identity.key())
    }

    /// Get an async connection
    async fn get_connection(&self) -> std::result::Result<redis::aio::MultiplexedConnection, String> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| format!("Redis connection failed: {}", e))
    }

    async fn try_read(&self, key: &str) -> std::result::Result<Option<Vec<RawRecord>>, String> {
        let mut conn = self.get_connection().await?;

        let data: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| format!("Redis GET failed: {}", e))?;

        match data {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| format!("Failed to deserialize records: {}", e)),
            None => Ok(None),
        }
    }

    async fn try_write(&self, key: &str, records: &[RawRecord]) -> std::result::Result<(), String> {
        let json = serde_json::to_string(records)
            .map_err(|e| format!("Failed to serialize records: {}", e))?;
        let mut conn = self.get_connection().await?;

        let cmd = match self.ttl_seconds {
            Some(ttl) => {
                let mut cmd = redis::cmd("SETEX");
                cmd.arg(key).arg(ttl).arg(&json);
                cmd
            }
            None => {
                let mut cmd = redis::cmd("SET");
                cmd.arg(key).arg(&json);
                cmd
            }
        };

        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| format!("Redis SET failed: {}", e))
    }

    async fn try_remove(&self, key: &str) -> std::result::Result<i64, String> {
        let mut conn = self.get_connection().await?;

        redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| format!("Redis DEL failed: {}", e))
    }
}

#[async_trait]
impl StorageDriver for RedisDriver {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn read(&self, identity: &Identity) -> Option<Vec<RawRecord>> {
        let key = self.build_key(identity);
        match self.try_read(&key).await {
            Ok(records) => {
                debug!(key = %key, found = records.is_some(), "Records loaded from Redis");
                records
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis read failed");
                None
            }
        }
    }

    async fn write(&self, identity: &Identity, records: &[RawRecord]) -> bool {
        let key = self.build_key(identity);
        match self.try_write(&key, records).await {
            Ok(()) => {
                debug!(key = %key, ttl = ?self.ttl_seconds, "Records saved to Redis");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis write failed");
                false
            }
        }
    }

    async fn remove(&self, identity: &Identity) -> bool {
        let key = self.build_key(identity);
        match self.try_remove(&key).await {
            Ok(deleted) => {
                debug!(key = %key, deleted = deleted > 0, "Records deleted from Redis");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis remove failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_configuration_error() {
        let result = RedisDriver::new("not a url");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_build_key_uses_prefix() {
        let driver = RedisDriver::with_options("redis://127.0.0.1:6379", "app:", None).unwrap();
        let identity = Identity::new("usage", "helper");
        assert_eq!(driver.build_key(&identity), "app:usage_helper_default");
    }

    #[tokio::test]
    async fn test_unreachable_server_degrades_to_failure() {
        // Port 1 is reserved and never runs Redis
        let driver = RedisDriver::new("redis://127.0.0.1:1").unwrap();
        let identity = Identity::new("usage", "helper");

        assert!(driver.read(&identity).await.is_none());
        assert!(!driver.write(&identity, &[]).await);
        assert!(!driver.remove(&identity).await);
    }

    // Redis tests require a running Redis instance
    // Run with: cargo test --features redis-tests
    #[cfg(feature = "redis-tests")]
    mod redis_tests {
        use super::*;
        use crate::record::{encode, Message};

        #[tokio::test]
        async fn test_redis_driver() {
            let driver = RedisDriver::new("redis://127.0.0.1:6379").unwrap();
            let identity = Identity::new("chatHistory", "redis-test");

            let raw = encode(&[Message::user("Hello from Redis")]).unwrap();
            assert!(driver.write(&identity, &raw).await);
            assert_eq!(driver.read(&identity).await, Some(raw));

            assert!(driver.remove(&identity).await);
            assert!(driver.read(&identity).await.is_none());
        }
    }
}
