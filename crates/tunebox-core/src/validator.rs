use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A cheap liveness check for a candidate stream URL.
#[async_trait]
pub trait UrlValidator: Send + Sync + 'static {
    /// Returns `true` when `url` is servable right now.
    ///
    /// Any failure, including hitting `timeout`, counts as not servable.
    async fn validate(&self, url: &str, timeout: Duration) -> bool;
}

#[async_trait]
impl<T: UrlValidator + ?Sized> UrlValidator for Arc<T> {
    async fn validate(&self, url: &str, timeout: Duration) -> bool {
        (**self).validate(url, timeout).await
    }
}
