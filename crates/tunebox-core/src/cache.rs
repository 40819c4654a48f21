use crate::content_id::ContentId;
use crate::error::CacheError;
use crate::record::ResolutionRecord;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A cache of resolved streams keyed by [`ContentId`].
///
/// Implementations may sit on a network store, so every operation can fail
/// with [`CacheError`]; a missing key is `Ok(None)`, never an error.
#[async_trait]
pub trait StreamCache: Send + Sync + 'static {
    /// Get a cached record.
    ///
    /// A returned record is not known to be servable; callers must validate it.
    async fn get(&self, id: &ContentId) -> Result<Option<ResolutionRecord>>;

    /// Store a record, replacing any previous one, expiring after `ttl`.
    async fn set(&self, id: &ContentId, record: &ResolutionRecord, ttl: Duration) -> Result<()>;

    /// Remove a record. Removing a missing key is not an error.
    async fn del(&self, id: &ContentId) -> Result<()>;
}

#[async_trait]
impl<T: StreamCache + ?Sized> StreamCache for Arc<T> {
    async fn get(&self, id: &ContentId) -> Result<Option<ResolutionRecord>> {
        (**self).get(id).await
    }

    async fn set(&self, id: &ContentId, record: &ResolutionRecord, ttl: Duration) -> Result<()> {
        (**self).set(id, record, ttl).await
    }

    async fn del(&self, id: &ContentId) -> Result<()> {
        (**self).del(id).await
    }
}
