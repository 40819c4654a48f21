use thiserror::Error;
use tunebox_core::{ExtractionFailure, ForbiddenReason};

pub type Result<T> = std::result::Result<T, ResolveError>;

/// Everything a resolution can report to its caller.
///
/// Cache and validation problems never show up here: they are absorbed by
/// the resolver and only cause a fallback to extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid content id: {0}")]
    InvalidInput(String),
    #[error("upstream requires authentication")]
    AuthRequired,
    #[error("content is not available: {0}")]
    Forbidden(ForbiddenReason),
    #[error("content not found")]
    NotFound,
    #[error("upstream extraction failed: {0}")]
    Upstream(String),
}

impl ResolveError {
    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::InvalidInput(_) => "invalid_input",
            ResolveError::AuthRequired => "auth_required",
            ResolveError::Forbidden(_) => "forbidden",
            ResolveError::NotFound => "not_found",
            ResolveError::Upstream(_) => "upstream_error",
        }
    }

    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResolveError::Upstream(_))
    }
}

impl From<ExtractionFailure> for ResolveError {
    fn from(failure: ExtractionFailure) -> Self {
        match failure {
            ExtractionFailure::InvalidInput(message) => Self::InvalidInput(message),
            ExtractionFailure::AuthRequired => Self::AuthRequired,
            ExtractionFailure::Forbidden(reason) => Self::Forbidden(reason),
            ExtractionFailure::NotFound => Self::NotFound,
            ExtractionFailure::UpstreamError(message) => Self::Upstream(message),
        }
    }
}
