mod health;
mod search;
mod stream;

pub use health::HealthResponse;
pub use search::{SearchHit, SearchParams};
pub use stream::{ErrorResponse, StreamRequest, StreamResponse};
