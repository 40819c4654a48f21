//! yt-dlp backed stream extraction.
//!
//! [`YtDlpExtractor`] turns a [`ContentId`](tunebox_core::ContentId) into a
//! direct audio URL, injecting cookies and a browser user agent, and
//! classifies upstream failures into
//! [`ExtractionFailure`](tunebox_core::ExtractionFailure).

pub mod classify;
pub mod credentials;
pub mod format;
pub mod ytdlp;

pub use classify::classify_failure;
pub use credentials::{CookieFileSource, EnvCookieSource};
pub use ytdlp::{YtDlpConfig, YtDlpExtractor};
