use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<crate::datasource::SourceError> for AppError {
    fn from(err: crate::datasource::SourceError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::engine::RateOutOfRange> for AppError {
    fn from(err: crate::engine::RateOutOfRange) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<crate::cache::UnknownCacheKey> for AppError {
    fn from(err: crate::cache::UnknownCacheKey) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<crate::domain::CurrencyParseError> for AppError {
    fn from(err: crate::domain::CurrencyParseError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "status": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
