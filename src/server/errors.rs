use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::github::GitHubError;
#[cfg(feature = "database")]
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid query or body
    #[error("{0}")]
    BadRequest(String),

    /// Route requires the upstream identity header
    #[error("{0}")]
    Unauthenticated(String),

    /// A feature this route depends on is not configured
    #[error("{0}")]
    Unavailable(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[cfg(feature = "database")]
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GitHub(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            #[cfg(feature = "database")]
            ApiError::Store(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {:#}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "Client error: {}", self);
        }

        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
