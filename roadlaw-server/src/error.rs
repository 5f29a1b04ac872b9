//! Error types for the `roadlaw-server` crate.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use roadlaw_rag::RagError;
use serde_json::json;
use thiserror::Error;

/// Startup configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid { name: &'static str, value: String, reason: String },

    #[error("failed to read .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),

    #[error(transparent)]
    Rag(#[from] RagError),
}

/// Request failures returned before any event is streamed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid or missing API key")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(json!({"detail": self.to_string()}))).into_response()
    }
}
