use crate::content_id::ContentId;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The outcome of a successful resolution.
///
/// Records are immutable once written: a re-resolution produces a new
/// record that replaces the old one under the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// The content this stream belongs to.
    pub content_id: ContentId,
    /// Direct, time-limited URL of the audio stream.
    pub stream_url: String,
    /// Container or format label reported by the extractor (e.g. `m4a`).
    pub format: Option<String>,
    /// When the extraction happened.
    pub fetched_at: Timestamp,
    /// How long the cache may keep the record.
    pub ttl: Duration,
}

impl ResolutionRecord {
    /// Creates a record stamped with the current time.
    pub fn new(
        content_id: ContentId,
        stream_url: impl Into<String>,
        format: Option<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            content_id,
            stream_url: stream_url.into(),
            format,
            fetched_at: Timestamp::now(),
            ttl,
        }
    }
}
