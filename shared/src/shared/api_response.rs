// API Response Types
// Standard response structures for HTTP APIs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::error::{AppError, ErrorKind};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(code: String, message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code,
                message,
                details: None,
            }),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// API Error type that can be returned from handlers
pub struct ApiError(pub AppError);

impl ApiError {
    /// Status and wire code for an error kind.
    pub fn status_and_code(kind: ErrorKind) -> (StatusCode, &'static str) {
        match kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::SubmissionFailure => (StatusCode::BAD_GATEWAY, "FORM_SUBMISSION_FAILED"),
            ErrorKind::Transient => (StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = Self::status_and_code(self.0.kind());

        let response = ApiResponse::<()>::error(error_code.to_string(), self.0.to_string());

        (status, Json(response)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError(AppError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::status_and_code(ErrorKind::Validation),
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        );
        assert_eq!(
            ApiError::status_and_code(ErrorKind::NotFound),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            ApiError::status_and_code(ErrorKind::Conflict),
            (StatusCode::CONFLICT, "CONFLICT")
        );
        assert_eq!(
            ApiError::status_and_code(ErrorKind::SubmissionFailure),
            (StatusCode::BAD_GATEWAY, "FORM_SUBMISSION_FAILED")
        );
        assert_eq!(
            ApiError::status_and_code(ErrorKind::Transient),
            (StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT_ERROR")
        );
    }

    #[test]
    fn test_envelope_serializes_camel_case() {
        let response = ApiResponse::success(serde_json::json!({"id": 1}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], serde_json::json!(true));
        assert!(value.get("timestamp").is_some());
        assert!(value.get("error").is_some());
    }
}
