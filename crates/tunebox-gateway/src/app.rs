use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{health_handler, search_handler, stream_handler};
use crate::state::AppState;

pub const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

pub struct App {}

impl App {
    pub fn router(state: AppState, cors: CorsLayer) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/stream", post(stream_handler))
            .route("/search", get(search_handler))
            .with_state(state)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }
}

/// Builds the CORS policy. An empty list or a `*` entry allows any origin.
pub fn cors_layer<S: AsRef<str>>(
    origins: &[S],
) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(CORS_MAX_AGE);

    if origins.is_empty() || origins.iter().any(|o| o.as_ref() == "*") {
        info!("CORS: allowing any origin");
        return Ok(cors.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    info!(origins = ?origins, "CORS: allowing configured origins");
    Ok(cors.allow_origin(AllowOrigin::list(origins)))
}
