//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::platform::PlatformError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// Required configuration missing or unusable. Fatal at startup.
    Config(String),

    /// Managed platform or object store failure outside the predict
    /// path. The upstream message is preserved verbatim.
    Platform(String),

    /// Any failure on the predict path, collapsed to one class at the
    /// request boundary.
    Prediction(String),

    /// Malformed input dataset during preprocessing.
    Dataset(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Platform(msg) => {
                tracing::error!("Platform error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Prediction(msg) => {
                tracing::error!("Prediction failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Prediction failed: {}", msg),
                )
            }
            AppError::Dataset(msg) => {
                tracing::error!("Dataset error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({ "detail": detail }));

        (status, body).into_response()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "configuration error: {}", msg),
            AppError::Platform(msg) => write!(f, "platform error: {}", msg),
            AppError::Prediction(msg) => write!(f, "prediction failed: {}", msg),
            AppError::Dataset(msg) => write!(f, "dataset error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<PlatformError> for AppError {
    fn from(err: PlatformError) -> Self {
        AppError::Platform(err.to_string())
    }
}
