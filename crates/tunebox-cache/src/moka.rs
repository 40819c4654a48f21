use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use tunebox_core::{CacheError, ContentId, ResolutionRecord, StreamCache};

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    record: ResolutionRecord,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// An in-process [`StreamCache`] built on Moka.
///
/// Suitable for single-node deployments and local development where running
/// Redis is not worth it. Unlike the Redis backend it can never be
/// unavailable.
#[derive(Debug, Clone)]
pub struct MokaStreamCache {
    cache: Cache<String, Entry>,
}

impl MokaStreamCache {
    /// Creates a cache holding at most [`DEFAULT_MAX_CAPACITY`] records.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }

    /// Number of live entries, after running pending maintenance.
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MokaStreamCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamCache for MokaStreamCache {
    async fn get(&self, id: &ContentId) -> Result<Option<ResolutionRecord>> {
        trace!(content_id = %id, "Fetching resolution record from Moka");

        match self.cache.get(id.as_str()).await {
            Some(entry) => {
                debug!(content_id = %id, "Cache hit in Moka");
                Ok(Some(entry.record))
            }
            None => {
                trace!(content_id = %id, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set(&self, id: &ContentId, record: &ResolutionRecord, ttl: Duration) -> Result<()> {
        let entry = Entry {
            record: record.clone(),
            ttl,
        };
        self.cache.insert(id.as_str().to_string(), entry).await;
        debug!(content_id = %id, ttl_secs = ttl.as_secs(), "Cached record in Moka");
        Ok(())
    }

    async fn del(&self, id: &ContentId) -> Result<()> {
        self.cache.invalidate(id.as_str()).await;
        debug!(content_id = %id, "Removed record from Moka (if present)");
        Ok(())
    }
}
