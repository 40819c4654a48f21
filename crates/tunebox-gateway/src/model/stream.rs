use serde::{Deserialize, Serialize};
use tunebox_resolver::ResolvedStream;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    pub video_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResponse {
    pub audio_url: String,
    pub format: Option<String>,
    pub cached: bool,
}

impl From<ResolvedStream> for StreamResponse {
    fn from(stream: ResolvedStream) -> Self {
        Self {
            audio_url: stream.stream_url,
            format: stream.format,
            cached: stream.from_cache,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    pub retryable: bool,
}
