use crate::error::{AppError, Result};
use crate::model::{StreamRequest, StreamResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::debug;

pub async fn stream_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<StreamRequest>, JsonRejection>,
) -> Result<Json<StreamResponse>> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let stream = state.resolver().resolve(&request.video_id).await?;
    debug!(
        content_id = %request.video_id,
        cached = stream.from_cache,
        "Stream resolved"
    );
    Ok(Json(stream.into()))
}
