//! The subset of yt-dlp's `--dump-single-json` output used to pick a stream.

use serde::Deserialize;

/// One entry of the `formats` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatInfo {
    pub format_id: Option<String>,
    pub url: Option<String>,
    pub ext: Option<String>,
    pub acodec: Option<String>,
    pub vcodec: Option<String>,
}

impl FormatInfo {
    fn has_audio(&self) -> bool {
        self.acodec.as_deref().is_some_and(|c| c != "none")
    }

    fn is_audio_only(&self) -> bool {
        self.has_audio() && self.vcodec.as_deref() == Some("none")
    }

    fn is_playable(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Top-level info document. When a format selector was passed, yt-dlp
/// flattens the chosen format into `url`/`ext`/`format_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub url: Option<String>,
    pub ext: Option<String>,
    pub format_id: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

/// A chosen stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStream {
    pub url: String,
    pub format: Option<String>,
}

impl VideoInfo {
    /// Returns the stream yt-dlp selected, or falls back to choosing from
    /// `formats` when the selector yielded nothing usable.
    pub fn select_stream(&self, preferred_ext: &str) -> Option<SelectedStream> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Some(SelectedStream {
                url: url.to_string(),
                format: self.ext.clone(),
            });
        }

        select_audio_format(&self.formats, preferred_ext).and_then(|f| {
            Some(SelectedStream {
                url: f.url.clone()?,
                format: f.ext.clone(),
            })
        })
    }
}

/// Picks the best audio format, preferring the `preferred_ext` container.
///
/// yt-dlp lists formats worst to best, so the last match wins. Audio-only
/// formats beat muxed ones regardless of container.
pub fn select_audio_format<'a>(formats: &'a [FormatInfo], preferred_ext: &str) -> Option<&'a FormatInfo> {
    let playable = || formats.iter().filter(|f| f.is_playable());

    playable()
        .filter(|f| f.is_audio_only() && f.ext.as_deref() == Some(preferred_ext))
        .last()
        .or_else(|| playable().filter(|f| f.is_audio_only()).last())
        .or_else(|| playable().filter(|f| f.has_audio()).last())
}
