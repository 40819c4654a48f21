//! Core types and traits for the tunebox stream resolver.
//!
//! This crate holds the domain types shared by every other crate
//! (content identifiers, resolution records, credentials, the error
//! taxonomy) plus the collaborator traits the resolver is wired from.

pub mod cache;
pub mod content_id;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod record;
pub mod validator;

pub use cache::StreamCache;
pub use content_id::ContentId;
pub use credentials::{CredentialBundle, CredentialSource, NoCredentials};
pub use error::{CacheError, CredentialError, ExtractionFailure, ForbiddenReason};
pub use extractor::StreamExtractor;
pub use record::ResolutionRecord;
pub use validator::UrlValidator;

/// A desktop browser user agent presented to upstream media hosts.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
