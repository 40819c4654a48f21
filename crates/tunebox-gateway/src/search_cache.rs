//! Storage for search results, shared between instances when Redis is used.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use redis::aio::{ConnectionLike, ConnectionManager};
use redis::AsyncCommands;
use tracing::{debug, trace};
use tunebox_cache::redis::{map_redis_error, DEFAULT_OP_TIMEOUT};
use tunebox_core::CacheError;

use crate::model::SearchHit;

pub type Result<T> = std::result::Result<T, CacheError>;

pub const DEFAULT_SEARCH_KEY_PREFIX: &str = "tb:search:";

#[async_trait]
pub trait SearchCache: Send + Sync + 'static {
    async fn get(&self, query: &str) -> Result<Option<Vec<SearchHit>>>;

    async fn set(&self, query: &str, hits: &[SearchHit], ttl: Duration) -> Result<()>;
}

#[async_trait]
impl<T: SearchCache + ?Sized> SearchCache for Arc<T> {
    async fn get(&self, query: &str) -> Result<Option<Vec<SearchHit>>> {
        (**self).get(query).await
    }

    async fn set(&self, query: &str, hits: &[SearchHit], ttl: Duration) -> Result<()> {
        (**self).set(query, hits, ttl).await
    }
}

/// Per-process search cache. Entries live for the TTL given at construction.
#[derive(Debug, Clone)]
pub struct MokaSearchCache {
    cache: Cache<String, Arc<Vec<SearchHit>>>,
}

impl MokaSearchCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl SearchCache for MokaSearchCache {
    async fn get(&self, query: &str) -> Result<Option<Vec<SearchHit>>> {
        Ok(self.cache.get(query).await.map(|hits| hits.as_ref().clone()))
    }

    async fn set(&self, query: &str, hits: &[SearchHit], _ttl: Duration) -> Result<()> {
        self.cache
            .insert(query.to_string(), Arc::new(hits.to_vec()))
            .await;
        Ok(())
    }
}

/// Search results as JSON under `<prefix><query>` with a Redis-side `EX`.
#[derive(Clone)]
pub struct RedisSearchCache<C = ConnectionManager> {
    conn: C,
    key_prefix: String,
    op_timeout: Duration,
}

impl<C> std::fmt::Debug for RedisSearchCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSearchCache")
            .field("key_prefix", &self.key_prefix)
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

impl<C> RedisSearchCache<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_SEARCH_KEY_PREFIX.to_string(),
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    fn cache_key(&self, query: &str) -> String {
        format!("{}{}", self.key_prefix, query)
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl std::future::Future<Output = redis::RedisResult<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(reply) => reply.map_err(|e| map_redis_error(operation, e)),
            Err(_) => Err(CacheError::Timeout(format!(
                "{operation}: no reply within {:?}",
                self.op_timeout
            ))),
        }
    }
}

#[async_trait]
impl<C> SearchCache for RedisSearchCache<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    async fn get(&self, query: &str) -> Result<Option<Vec<SearchHit>>> {
        let key = self.cache_key(query);
        let mut conn = self.conn.clone();
        let cached: Option<String> = self
            .bounded("failed to fetch search results", conn.get(&key))
            .await?;

        let Some(cached) = cached else {
            trace!(query = %query, "Search miss in Redis");
            return Ok(None);
        };
        serde_json::from_str(&cached).map(Some).map_err(|e| {
            CacheError::InvalidData(format!("invalid cached value for key '{key}': {e}"))
        })
    }

    async fn set(&self, query: &str, hits: &[SearchHit], ttl: Duration) -> Result<()> {
        let key = self.cache_key(query);
        let json = serde_json::to_string(hits)
            .map_err(|e| CacheError::Serialization(format!("failed to serialize hits: {e}")))?;

        let mut conn = self.conn.clone();
        self.bounded(
            "failed to store search results",
            conn.set_ex::<_, _, ()>(&key, json, ttl.as_secs().max(1)),
        )
        .await?;
        debug!(query = %query, results = hits.len(), "Cached search results in Redis");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str) -> SearchHit {
        SearchHit {
            video_id: id.to_string(),
            title: format!("title {id}"),
            thumbnail: None,
        }
    }

    #[tokio::test]
    async fn moka_round_trips_hits() {
        let cache = MokaSearchCache::new(100, Duration::from_secs(60));
        assert!(cache.get("lofi").await.unwrap().is_none());

        cache
            .set("lofi", &[hit("a"), hit("b")], Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("lofi").await.unwrap(), Some(vec![hit("a"), hit("b")]));
        assert!(cache.get("jazz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn moka_entries_expire() {
        let cache = MokaSearchCache::new(100, Duration::from_millis(100));
        cache.set("lofi", &[hit("a")], Duration::ZERO).await.unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(cache.get("lofi").await.unwrap().is_none());
    }
}
