use std::fmt::Display;
use thiserror::Error;

/// Failures of the resolution cache backend.
///
/// A miss is never an error: backends answer `Ok(None)` for it.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

impl CacheError {
    /// Whether the backend could not be reached in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::Unavailable(_) | CacheError::Timeout(_))
    }
}

/// Why the upstream refuses to serve a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    Private,
    Copyright,
    GeoRestricted,
    MembersOnly,
}

impl ForbiddenReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForbiddenReason::Private => "private",
            ForbiddenReason::Copyright => "copyright",
            ForbiddenReason::GeoRestricted => "geo-restricted",
            ForbiddenReason::MembersOnly => "members-only",
        }
    }
}

impl Display for ForbiddenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified outcome of a failed extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("authentication required")]
    AuthRequired,
    #[error("content is forbidden: {0}")]
    Forbidden(ForbiddenReason),
    #[error("content not found")]
    NotFound,
    #[error("upstream error: {0}")]
    UpstreamError(String),
}

/// Failure to load credential material.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read credentials from {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },
    #[error("credentials from {0} are not valid UTF-8")]
    Encoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_unavailable_count_as_unavailable() {
        assert!(CacheError::Unavailable("down".into()).is_unavailable());
        assert!(CacheError::Timeout("slow".into()).is_unavailable());
        assert!(!CacheError::InvalidData("garbage".into()).is_unavailable());
        assert!(!CacheError::Serialization("oops".into()).is_unavailable());
    }

    #[test]
    fn forbidden_displays_reason() {
        let failure = ExtractionFailure::Forbidden(ForbiddenReason::Copyright);
        assert_eq!(failure.to_string(), "content is forbidden: copyright");
        assert_eq!(ForbiddenReason::Private.to_string(), "private");
    }
}
