use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeishiError {
    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Recognition error: {0}")]
    Recognition(String),

    #[error("Recognition unavailable: {0}")]
    RecognitionUnavailable(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for MeishiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MeishiError::Decode(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            MeishiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            MeishiError::Recognition(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            MeishiError::RecognitionUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            MeishiError::Llm(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            MeishiError::LlmUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            MeishiError::Http(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            MeishiError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            MeishiError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            MeishiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, MeishiError>;
