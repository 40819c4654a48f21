use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tunebox_resolver::ResolveError;

use crate::catalog::CatalogError;
use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("{0}")]
    BadRequest(String),
    #[error("search is not configured")]
    SearchDisabled,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Resolve(e) => match e {
                ResolveError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                ResolveError::AuthRequired => StatusCode::UNAUTHORIZED,
                ResolveError::Forbidden(_) => StatusCode::FORBIDDEN,
                ResolveError::NotFound => StatusCode::NOT_FOUND,
                ResolveError::Upstream(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::SearchDisabled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Catalog(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Resolve(e) => e.code(),
            AppError::BadRequest(_) => "invalid_input",
            AppError::SearchDisabled => "search_unavailable",
            AppError::Catalog(_) => "upstream_error",
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            AppError::Resolve(e) => e.is_retryable(),
            AppError::Catalog(_) => true,
            AppError::BadRequest(_) | AppError::SearchDisabled => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            retryable: self.is_retryable(),
        };
        (self.status(), Json(body)).into_response()
    }
}
