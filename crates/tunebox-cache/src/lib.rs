//! Resolution cache backends.
//!
//! [`RedisStreamCache`] is the production backend shared between gateway
//! instances; [`MokaStreamCache`] keeps everything in process.

pub mod moka;
pub mod redis;

pub use self::moka::MokaStreamCache;
pub use self::redis::{RedisCacheConfig, RedisStreamCache};
pub use tunebox_core::{CacheError, StreamCache};
