//! Video search backed by the YouTube Data API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

use crate::model::SearchHit;
use crate::search_cache::{MokaSearchCache, SearchCache};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_SEARCH_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_RESULTS: u8 = 10;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("search upstream failed: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait Catalog: Send + Sync + 'static {
    /// Searches for videos matching a non-empty query.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError>;
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for Arc<T> {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError> {
        (**self).search(query).await
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct CatalogConfig {
    #[builder(setter(into))]
    pub api_key: String,
    #[builder(default = DEFAULT_API_BASE.to_string(), setter(into))]
    pub api_base: String,
    #[builder(default = DEFAULT_SEARCH_TTL)]
    pub cache_ttl: Duration,
    #[builder(default = 1_000)]
    pub cache_capacity: u64,
    #[builder(default = DEFAULT_MAX_RESULTS)]
    pub max_results: u8,
    #[builder(default = Duration::from_secs(10))]
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchListResponse {
    /// Keeps video results only; channels and playlists carry no `videoId`.
    fn into_hits(self) -> Vec<SearchHit> {
        self.items
            .into_iter()
            .filter_map(|item| {
                Some(SearchHit {
                    video_id: item.id.video_id?,
                    title: item.snippet.title,
                    thumbnail: item.snippet.thumbnails.default.map(|t| t.url),
                })
            })
            .collect()
    }
}

/// `search.list` client with a result cache in front of it.
///
/// Results are cached in-process unless another [`SearchCache`] is supplied
/// through [`YouTubeCatalog::with_cache`].
#[derive(Clone)]
pub struct YouTubeCatalog {
    client: reqwest::Client,
    config: CatalogConfig,
    cache: Arc<dyn SearchCache>,
}

impl std::fmt::Debug for YouTubeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeCatalog")
            .field("api_base", &self.config.api_base)
            .field("cache_ttl", &self.config.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl YouTubeCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: CatalogConfig) -> Self {
        let cache = Arc::new(MokaSearchCache::new(config.cache_capacity, config.cache_ttl));
        Self {
            client,
            config,
            cache,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn SearchCache>) -> Self {
        self.cache = cache;
        self
    }

    async fn fetch(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError> {
        let max_results = self.config.max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.config.api_base.trim_end_matches('/')))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("q", query),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(upstream)?;

        let listing: SearchListResponse = response.json().await.map_err(upstream)?;
        Ok(listing.into_hits())
    }
}

// Request URLs carry the API key.
fn upstream(e: reqwest::Error) -> CatalogError {
    CatalogError::Upstream(e.without_url().to_string())
}

#[async_trait]
impl Catalog for YouTubeCatalog {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError> {
        let key = query.trim();
        match self.cache.get(key).await {
            Ok(Some(hits)) => {
                trace!(query = %key, "Search cache hit");
                return Ok(hits);
            }
            Ok(None) => {}
            // A broken cache only costs an upstream call.
            Err(e) => warn!(query = %key, error = %e, "Search cache lookup failed"),
        }

        let hits = self.fetch(key).await.inspect_err(|e| {
            warn!(query = %key, error = %e, "Search request failed");
        })?;
        debug!(query = %key, results = hits.len(), "Search fetched");
        if let Err(e) = self.cache.set(key, &hits, self.config.cache_ttl).await {
            warn!(query = %key, error = %e, "Failed to cache search results");
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn spawn_api(calls: Arc<AtomicUsize>) -> String {
        let app = Router::new()
            .route(
                "/search",
                get(move |Query(params): Query<HashMap<String, String>>| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        if params.get("key").map(String::as_str) != Some("test-key") {
                            return Err(StatusCode::FORBIDDEN);
                        }
                        assert_eq!(params["part"], "snippet");
                        assert_eq!(params["type"], "video");
                        assert_eq!(params["maxResults"], "10");
                        let q = params["q"].clone();
                        Ok(Json(serde_json::json!({
                            "items": [
                                {
                                    "id": { "kind": "youtube#video", "videoId": "abc123" },
                                    "snippet": {
                                        "title": format!("{q} (live)"),
                                        "thumbnails": { "default": { "url": "https://i.ytimg.com/vi/abc123/default.jpg" } }
                                    }
                                },
                                {
                                    "id": { "kind": "youtube#channel", "channelId": "UC1" },
                                    "snippet": { "title": "a channel" }
                                }
                            ]
                        })))
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn catalog(api_base: String, api_key: &str) -> YouTubeCatalog {
        YouTubeCatalog::new(
            CatalogConfig::builder()
                .api_key(api_key)
                .api_base(api_base)
                .build(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn maps_video_items_and_skips_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = spawn_api(Arc::clone(&calls)).await;

        let hits = catalog(base, "test-key").search("lofi").await.unwrap();

        assert_eq!(
            hits,
            vec![SearchHit {
                video_id: "abc123".to_string(),
                title: "lofi (live)".to_string(),
                thumbnail: Some("https://i.ytimg.com/vi/abc123/default.jpg".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn repeated_queries_are_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = spawn_api(Arc::clone(&calls)).await;
        let catalog = catalog(base, "test-key");

        let first = catalog.search("lofi").await.unwrap();
        let second = catalog.search("  lofi ").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upstream_rejection_is_reported_without_the_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = spawn_api(Arc::clone(&calls)).await;

        let err = catalog(base, "wrong-key").search("lofi").await.unwrap_err();

        let CatalogError::Upstream(message) = err;
        assert!(message.contains("403"), "{message}");
        assert!(!message.contains("wrong-key"), "{message}");
    }

    #[tokio::test]
    async fn supplied_cache_is_shared_between_catalogs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = spawn_api(Arc::clone(&calls)).await;
        let shared: Arc<dyn SearchCache> =
            Arc::new(MokaSearchCache::new(100, Duration::from_secs(60)));

        let first = catalog(base.clone(), "test-key").with_cache(Arc::clone(&shared));
        let second = catalog(base, "test-key").with_cache(shared);

        let a = first.search("lofi").await.unwrap();
        let b = second.search("lofi").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Every lookup and store fails.
    struct BrokenCache;

    #[async_trait]
    impl SearchCache for BrokenCache {
        async fn get(&self, _: &str) -> crate::search_cache::Result<Option<Vec<SearchHit>>> {
            Err(tunebox_core::CacheError::Unavailable("down".to_string()))
        }

        async fn set(
            &self,
            _: &str,
            _: &[SearchHit],
            _: Duration,
        ) -> crate::search_cache::Result<()> {
            Err(tunebox_core::CacheError::Timeout("slow".to_string()))
        }
    }

    #[tokio::test]
    async fn cache_outage_falls_through_to_upstream() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = spawn_api(Arc::clone(&calls)).await;
        let catalog = catalog(base, "test-key").with_cache(Arc::new(BrokenCache));

        assert_eq!(catalog.search("lofi").await.unwrap().len(), 1);
        assert_eq!(catalog.search("lofi").await.unwrap().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = spawn_api(Arc::clone(&calls)).await;
        let catalog = catalog(base, "wrong-key");

        assert!(catalog.search("lofi").await.is_err());
        assert!(catalog.search("lofi").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
