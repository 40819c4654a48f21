mod health;
mod search;
mod stream;

pub use health::health_handler;
pub use search::search_handler;
pub use stream::stream_handler;
