use crate::Result;
use async_trait::async_trait;

/// A stream URL that is servable right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub stream_url: String,
    pub format: Option<String>,
    /// Whether the URL came from a validated cache entry rather than a
    /// fresh extraction.
    pub from_cache: bool,
}

#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Resolves an untrusted content id to a playable stream.
    async fn resolve(&self, content_id: &str) -> Result<ResolvedStream>;
}
