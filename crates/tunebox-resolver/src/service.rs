use std::sync::Arc;
use std::time::Duration;

use crate::resolver::{ResolvedStream, Resolver};
use crate::{ResolveError, Result};
use async_trait::async_trait;
use tracing::{debug, instrument, trace, warn};
use tunebox_core::{
    CacheError, ContentId, CredentialSource, ResolutionRecord, StreamCache, StreamExtractor,
    UrlValidator,
};
use typed_builder::TypedBuilder;

pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Tuning for [`StreamResolver`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ResolverConfig {
    /// Bound for the liveness check of a cached URL.
    #[builder(default = DEFAULT_VALIDATION_TIMEOUT)]
    pub validation_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Resolves content ids through cache, validator and extractor.
///
/// One call walks `cache lookup → validate hit → extract → write back` at
/// most once; there is no retry loop and no de-duplication of concurrent
/// requests for the same id. Cache failures degrade to extraction and are
/// never reported to the caller.
#[derive(Debug)]
pub struct StreamResolver<C, V, E, S> {
    cache: Arc<C>,
    validator: Arc<V>,
    extractor: Arc<E>,
    credentials: Arc<S>,
    config: ResolverConfig,
}

impl<C, V, E, S> Clone for StreamResolver<C, V, E, S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            validator: Arc::clone(&self.validator),
            extractor: Arc::clone(&self.extractor),
            credentials: Arc::clone(&self.credentials),
            config: self.config.clone(),
        }
    }
}

impl<C, V, E, S> StreamResolver<C, V, E, S>
where
    C: StreamCache,
    V: UrlValidator,
    E: StreamExtractor,
    S: CredentialSource,
{
    pub fn new(cache: C, validator: V, extractor: E, credentials: S) -> Self {
        Self::with_config(cache, validator, extractor, credentials, ResolverConfig::default())
    }

    pub fn with_config(
        cache: C,
        validator: V,
        extractor: E,
        credentials: S,
        config: ResolverConfig,
    ) -> Self {
        Self {
            cache: Arc::new(cache),
            validator: Arc::new(validator),
            extractor: Arc::new(extractor),
            credentials: Arc::new(credentials),
            config,
        }
    }

    /// Resolves an untrusted content id to a playable stream.
    pub async fn resolve(&self, content_id: &str) -> Result<ResolvedStream> {
        Resolver::resolve(self, content_id).await
    }

    /// Returns the cached record if it still validates.
    ///
    /// A record that fails validation is deleted before returning, so the
    /// following extraction never races a stale pointer.
    async fn validated_hit(&self, id: &ContentId) -> Option<ResolutionRecord> {
        let record = match self.cache.get(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                trace!(content_id = %id, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(
                    content_id = %id,
                    error = %e,
                    unavailable = e.is_unavailable(),
                    "Cache lookup failed, falling back to extraction"
                );
                if matches!(e, CacheError::InvalidData(_)) {
                    self.invalidate(id).await;
                }
                return None;
            }
        };

        if self
            .validator
            .validate(&record.stream_url, self.config.validation_timeout)
            .await
        {
            debug!(content_id = %id, "Cached stream is still servable");
            return Some(record);
        }

        debug!(content_id = %id, "Cached stream failed validation, invalidating");
        self.invalidate(id).await;
        None
    }

    async fn invalidate(&self, id: &ContentId) {
        if let Err(e) = self.cache.del(id).await {
            warn!(content_id = %id, error = %e, "Failed to invalidate stale cache entry");
        }
    }

    async fn extract(&self, id: &ContentId) -> Result<ResolutionRecord> {
        let credentials = self.credentials.load().await.unwrap_or_else(|e| {
            warn!(content_id = %id, error = %e, "Failed to load credentials, extracting without");
            None
        });

        let record = self
            .extractor
            .extract(id, credentials.as_ref())
            .await
            .inspect_err(|e| debug!(content_id = %id, error = %e, "Extraction failed"))?;

        if let Err(e) = self.cache.set(id, &record, record.ttl).await {
            warn!(content_id = %id, error = %e, "Failed to cache resolved stream");
        }
        Ok(record)
    }
}

#[async_trait]
impl<C, V, E, S> Resolver for StreamResolver<C, V, E, S>
where
    C: StreamCache,
    V: UrlValidator,
    E: StreamExtractor,
    S: CredentialSource,
{
    #[instrument(skip_all, fields(content_id = %content_id))]
    async fn resolve(&self, content_id: &str) -> Result<ResolvedStream> {
        let id = ContentId::parse(content_id).map_err(ResolveError::from)?;

        if let Some(record) = self.validated_hit(&id).await {
            return Ok(ResolvedStream {
                stream_url: record.stream_url,
                format: record.format,
                from_cache: true,
            });
        }

        let record = self.extract(&id).await?;
        debug!(content_id = %id, "Resolved stream by extraction");
        Ok(ResolvedStream {
            stream_url: record.stream_url,
            format: record.format,
            from_cache: false,
        })
    }
}
