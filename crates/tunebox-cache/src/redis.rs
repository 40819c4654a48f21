use async_trait::async_trait;
use redis::aio::{ConnectionLike, ConnectionManager};
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};
use tunebox_core::{CacheError, ContentId, ResolutionRecord, StreamCache};
use typed_builder::TypedBuilder;

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

pub const DEFAULT_KEY_PREFIX: &str = "tb:stream:";
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_millis(500);

/// Settings for [`RedisStreamCache`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisCacheConfig {
    /// Prefix prepended to every content id to form the Redis key.
    #[builder(default = DEFAULT_KEY_PREFIX.to_string(), setter(into))]
    pub key_prefix: String,
    /// Upper bound for a single Redis round-trip.
    #[builder(default = DEFAULT_OP_TIMEOUT)]
    pub op_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A Redis-backed [`StreamCache`].
///
/// Records are stored as JSON strings under `<prefix><content id>` and
/// expire through Redis' own `EX` handling. Every command is bounded by the
/// configured operation timeout, so a stalled backend surfaces as
/// [`CacheError::Timeout`] instead of blocking the resolver.
#[derive(Clone)]
pub struct RedisStreamCache<C = ConnectionManager> {
    conn: C,
    config: RedisCacheConfig,
}

impl<C> std::fmt::Debug for RedisStreamCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStreamCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Classifies a Redis failure; `operation` prefixes the message.
pub fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

/// Opens a reconnecting connection manager to `url`.
///
/// The manager is cheap to clone; clones share one multiplexed connection.
pub async fn connect_manager(url: &str, timeout: Duration) -> Result<ConnectionManager> {
    let client = redis::Client::open(url)
        .map_err(|e| CacheError::Operation(format!("invalid redis url: {e}")))?;
    tokio::time::timeout(timeout, client.get_connection_manager())
        .await
        .map_err(|_| CacheError::Timeout(format!("connecting to {url}")))?
        .map_err(|e| map_redis_error("failed to connect to Redis", e))
}

impl RedisStreamCache<ConnectionManager> {
    /// Connects to Redis at `url` with a reconnecting connection manager.
    pub async fn connect(url: &str, config: RedisCacheConfig) -> Result<Self> {
        let conn = connect_manager(url, config.op_timeout * 10).await?;
        Ok(Self::with_config(conn, config))
    }
}

impl<C> RedisStreamCache<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    /// Creates a cache over an existing connection with default settings.
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, RedisCacheConfig::default())
    }

    pub fn with_config(conn: C, config: RedisCacheConfig) -> Self {
        Self { conn, config }
    }

    /// Generates the Redis key for a content id.
    fn cache_key(&self, id: &ContentId) -> String {
        format!("{}{}", self.config.key_prefix, id.as_str())
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_redis_error(operation, e)),
            Err(_) => Err(CacheError::Timeout(format!(
                "{operation}: no reply within {:?}",
                self.config.op_timeout
            ))),
        }
    }
}

#[async_trait]
impl<C> StreamCache for RedisStreamCache<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    async fn get(&self, id: &ContentId) -> Result<Option<ResolutionRecord>> {
        let key = self.cache_key(id);
        trace!(content_id = %id, "Fetching resolution record from Redis");

        let mut conn = self.conn.clone();
        let cached: Option<String> = self
            .bounded("failed to fetch value from Redis", conn.get(&key))
            .await
            .inspect_err(|e| warn!(content_id = %id, error = %e, "Redis error on get"))?;

        let Some(cached) = cached else {
            trace!(content_id = %id, "Cache miss in Redis");
            return Ok(None);
        };

        debug!(content_id = %id, "Cache hit in Redis");
        serde_json::from_str::<ResolutionRecord>(&cached)
            .map(Some)
            .map_err(|e| {
                warn!(content_id = %id, error = %e, "Failed to deserialize cached record");
                CacheError::InvalidData(format!("invalid cached value for key '{key}': {e}"))
            })
    }

    async fn set(&self, id: &ContentId, record: &ResolutionRecord, ttl: Duration) -> Result<()> {
        let key = self.cache_key(id);
        trace!(content_id = %id, ttl_secs = ttl.as_secs(), "Storing resolution record in Redis");

        let json = serde_json::to_string(record).map_err(|e| {
            warn!(content_id = %id, error = %e, "Failed to serialize record for caching");
            CacheError::Serialization(format!("failed to serialize cache value: {e}"))
        })?;

        // EX 0 is rejected by Redis
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        self.bounded(
            "failed to write value to Redis",
            conn.set_ex::<_, _, ()>(&key, json, seconds),
        )
        .await
        .inspect_err(|e| warn!(content_id = %id, error = %e, "Failed to cache record in Redis"))?;

        debug!(content_id = %id, "Cached record in Redis");
        Ok(())
    }

    async fn del(&self, id: &ContentId) -> Result<()> {
        let key = self.cache_key(id);
        trace!(content_id = %id, "Removing resolution record from Redis");

        let mut conn = self.conn.clone();
        self.bounded("failed to delete value from Redis", conn.del::<_, ()>(&key))
            .await
            .inspect_err(|e| {
                warn!(content_id = %id, error = %e, "Failed to remove record from Redis")
            })?;

        debug!(content_id = %id, "Removed record from Redis");
        Ok(())
    }
}
