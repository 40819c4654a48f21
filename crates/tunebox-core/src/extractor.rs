use crate::content_id::ContentId;
use crate::credentials::CredentialBundle;
use crate::error::ExtractionFailure;
use crate::record::ResolutionRecord;
use async_trait::async_trait;
use std::sync::Arc;

/// Turns a content id into a direct stream URL.
///
/// Extraction is the source of truth for resolution: a successful result
/// is trusted without a further liveness check.
#[async_trait]
pub trait StreamExtractor: Send + Sync + 'static {
    async fn extract(
        &self,
        id: &ContentId,
        credentials: Option<&CredentialBundle>,
    ) -> Result<ResolutionRecord, ExtractionFailure>;
}

#[async_trait]
impl<T: StreamExtractor + ?Sized> StreamExtractor for Arc<T> {
    async fn extract(
        &self,
        id: &ContentId,
        credentials: Option<&CredentialBundle>,
    ) -> Result<ResolutionRecord, ExtractionFailure> {
        (**self).extract(id, credentials).await
    }
}
