//! Redis-backed key/value store for client sessions
//!
//! Every key is prefixed with the configured namespace, so several
//! deployments can share one Redis instance. Entries written with
//! [`RedisPool::set`] expire after the configured idle timeout.

use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{debug, info};

use crate::error::{CacheError, CacheResult};

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    pub namespace: String,
    /// Expiry applied by [`RedisPool::set`]; `None` keeps entries forever
    pub default_ttl: Option<u64>,
}

impl RedisConfig {
    /// Read the configuration from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_NAMESPACE`: Key prefix (default: "storefront")
    /// - `REDIS_SESSION_TTL`: expiry in seconds; unset or 0 disables it
    pub fn from_env() -> CacheResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let namespace =
            std::env::var("REDIS_NAMESPACE").unwrap_or_else(|_| "storefront".to_string());

        let default_ttl = match std::env::var("REDIS_SESSION_TTL") {
            Ok(raw) => {
                let seconds: u64 = raw.parse().map_err(|_| {
                    CacheError::Configuration(format!(
                        "REDIS_SESSION_TTL must be a number of seconds, got '{}'",
                        raw
                    ))
                })?;
                (seconds > 0).then_some(seconds)
            }
            Err(_) => None,
        };

        Ok(RedisConfig {
            url,
            namespace,
            default_ttl,
        })
    }
}

/// Namespaced handle on a Redis server
///
/// Cloning is cheap; connections are multiplexed per call.
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    namespace: String,
    default_ttl: Option<u64>,
}

impl RedisPool {
    /// Create a handle; no connection is made until the first command
    pub fn new(config: &RedisConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| CacheError::Configuration(e.to_string()))?;
        info!(
            "Redis client initialized with URL: {} (namespace '{}')",
            config.url, config.namespace
        );

        Ok(RedisPool {
            client,
            namespace: config.namespace.clone(),
            default_ttl: config.default_ttl,
        })
    }

    /// Full key as stored in Redis
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    async fn connection(&self) -> CacheResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::Connection)
    }

    /// Store a value with the default expiry
    pub async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Store a value with an explicit expiry
    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let key = self.namespaced(key);
        debug!("SET {} (ttl {:?})", key, ttl_seconds);

        match ttl_seconds {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl).await,
            None => conn.set::<_, _, ()>(key, value).await,
        }
        .map_err(CacheError::Command)
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get(self.namespaced(key))
            .await
            .map_err(CacheError::Command)
    }

    /// Remove a key; true when it existed
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn
            .del(self.namespaced(key))
            .await
            .map_err(CacheError::Command)?;
        Ok(removed > 0)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::Command)?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_config() -> RedisConfig {
        RedisConfig {
            url: "redis://localhost:6379".to_string(),
            namespace: "storefront-test".to_string(),
            default_ttl: Some(5),
        }
    }

    #[test]
    fn test_keys_are_namespaced() {
        let pool = RedisPool::new(&test_config()).unwrap();
        assert_eq!(pool.namespaced("session:abc"), "storefront-test:session:abc");
    }

    #[test]
    fn test_invalid_url_is_a_configuration_error() {
        let mut config = test_config();
        config.url = "not a url".to_string();
        assert!(matches!(
            RedisPool::new(&config),
            Err(CacheError::Configuration(_))
        ));
    }

    #[test]
    #[serial]
    fn test_session_ttl_from_env() {
        unsafe {
            std::env::set_var("REDIS_SESSION_TTL", "3600");
        }
        assert_eq!(RedisConfig::from_env().unwrap().default_ttl, Some(3600));

        unsafe {
            std::env::set_var("REDIS_SESSION_TTL", "0");
        }
        assert_eq!(RedisConfig::from_env().unwrap().default_ttl, None);

        unsafe {
            std::env::set_var("REDIS_SESSION_TTL", "soon");
        }
        assert!(RedisConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("REDIS_SESSION_TTL");
        }
        assert_eq!(RedisConfig::from_env().unwrap().default_ttl, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_get_delete() {
        let pool = RedisPool::new(&test_config()).unwrap();
        assert!(pool.health_check().await.unwrap());

        pool.set("test_key", "test_value").await.unwrap();
        assert_eq!(
            pool.get("test_key").await.unwrap(),
            Some("test_value".to_string())
        );

        assert!(pool.delete("test_key").await.unwrap());
        assert!(!pool.delete("test_key").await.unwrap());
        assert_eq!(pool.get("test_key").await.unwrap(), None);
    }
}
