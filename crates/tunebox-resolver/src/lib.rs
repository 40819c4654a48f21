//! The resolve-validate-cache loop.
//!
//! [`StreamResolver`] answers "give me a playable URL for this content id"
//! by trying the cache first, probing any hit before trusting it, and
//! falling back to a fresh extraction whose result is written back.
//!
//! ```rust,no_run
//! use tunebox_cache::MokaStreamCache;
//! use tunebox_core::NoCredentials;
//! use tunebox_extractor::{YtDlpConfig, YtDlpExtractor};
//! use tunebox_resolver::StreamResolver;
//! use tunebox_validator::{HttpUrlValidator, ValidatorConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = StreamResolver::new(
//!     MokaStreamCache::new(),
//!     HttpUrlValidator::new(ValidatorConfig::default())?,
//!     YtDlpExtractor::new(YtDlpConfig::default()),
//!     NoCredentials,
//! );
//!
//! let stream = resolver.resolve("dQw4w9WgXcQ").await?;
//! println!("play {}", stream.stream_url);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod resolver;
pub mod service;

pub use error::{ResolveError, Result};
pub use resolver::{ResolvedStream, Resolver};
pub use service::{ResolverConfig, StreamResolver};
