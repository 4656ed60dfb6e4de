//! # V1 API Response Envelope & Error Contract
//!
//! Defines the canonical wire format for all v1 API responses. Every endpoint
//! returns an [`ApiResponse<T>`] envelope with two optional top-level fields:
//!
//! ```json
//! {
//!   "data": { ... },       // present on success, absent on error
//!   "error": { "code": "invalid_request", "message": "..." }  // present on error
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::MeishiError;

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request was malformed, had invalid parameters, or failed
    /// validation (including undecodable image uploads). HTTP 400.
    InvalidRequest,
    /// Authentication is required or the provided credentials are invalid.
    /// HTTP 401.
    Unauthorized,
    /// The recognition engine or the extraction collaborator failed.
    /// HTTP 502.
    RecognitionFailed,
    /// A required backend is not configured or could not be initialized.
    /// HTTP 503.
    ServiceUnavailable,
    /// An unexpected server-side error occurred. Internal details are never
    /// leaked to the client. HTTP 500.
    InternalError,
}

impl ErrorCode {
    /// Returns the HTTP status code corresponding to this error code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RecognitionFailed => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured error payload within the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Machine-readable error classification.
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
}

/// Canonical v1 API response envelope.
///
/// On success, `data` is present and `error` is absent; on error the other
/// way around. The HTTP status code is derived from the error code (on
/// error) or set by the constructor (on success).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// The response payload. Present on success, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error details. Present on error, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }
}

impl<T: Serialize> From<MeishiError> for ApiResponse<T> {
    fn from(error: MeishiError) -> Self {
        let code = match &error {
            MeishiError::Decode(_) | MeishiError::Validation(_) | MeishiError::Json(_) => {
                ErrorCode::InvalidRequest
            }
            MeishiError::Recognition(_) | MeishiError::Llm(_) | MeishiError::Http(_) => {
                ErrorCode::RecognitionFailed
            }
            MeishiError::RecognitionUnavailable(_) | MeishiError::LlmUnavailable(_) => {
                ErrorCode::ServiceUnavailable
            }
            MeishiError::Io(_) | MeishiError::Internal(_) => ErrorCode::InternalError,
        };
        Self::error(code, error.to_string())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::RecognitionFailed.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::ServiceUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::InternalError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_success_envelope_omits_error() {
        let response = ApiResponse::success(serde_json::json!({"ok": true}));
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("data").is_some());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let response = ApiResponse::<()>::error(ErrorCode::InvalidRequest, "bad");
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("data").is_none());
        assert_eq!(value["error"]["code"], "invalid_request");
    }

    #[test]
    fn test_meishi_error_conversion() {
        let response: ApiResponse<()> =
            MeishiError::Decode("not an image".to_string()).into();
        assert_eq!(response.error.as_ref().unwrap().code, ErrorCode::InvalidRequest);

        let response: ApiResponse<()> =
            MeishiError::RecognitionUnavailable("no backend".to_string()).into();
        assert_eq!(
            response.error.as_ref().unwrap().code,
            ErrorCode::ServiceUnavailable
        );
    }
}
