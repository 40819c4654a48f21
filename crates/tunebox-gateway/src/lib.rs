//! HTTP surface of tunebox: stream resolution and video search.

pub mod app;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod model;
pub mod search_cache;
pub mod state;

pub use app::{cors_layer, App};
pub use catalog::{Catalog, CatalogConfig, CatalogError, YouTubeCatalog};
pub use search_cache::{MokaSearchCache, RedisSearchCache, SearchCache};
pub use state::AppState;
