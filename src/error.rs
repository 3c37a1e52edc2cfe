use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    /// An append that the store rejected. Reported, never retried.
    #[error("Failed to log mood: {0}")]
    WriteFailed(StoreError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::WriteFailed(e) => {
                tracing::error!(error = %e, "Mood append failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Store(StoreError::DestinationNotFound(msg)) => {
                tracing::error!(error = %msg, "Store destination not found");
                (StatusCode::NOT_FOUND, msg.clone())
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store error");
                (
                    StatusCode::BAD_GATEWAY,
                    "Could not read mood data from the store".into(),
                )
            }
        };

        let body = json!({
            "error": {
                "message": message,
                "code": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Well-formed JSON of the wrong shape is a validation failure; anything
/// that is not JSON at all is a bad request.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::Validation(e.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
