use crate::error::{AppError, Result};
use crate::model::{SearchHit, SearchParams};
use crate::state::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

pub async fn search_handler(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<SearchHit>>> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("search query must not be empty".into()));
    }

    let catalog = state.catalog().ok_or(AppError::SearchDisabled)?;
    Ok(Json(catalog.search(query).await?))
}
