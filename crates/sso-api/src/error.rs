//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use sso_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// HTTP-facing wrapper around [`AppError`].
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code for an error kind.
    pub fn status_for(kind: ErrorKind) -> StatusCode {
        match kind {
            ErrorKind::InvalidCredentials | ErrorKind::UserAlreadyExists | ErrorKind::Validation => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::TokenInvalid | ErrorKind::SessionInvalidated | ErrorKind::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Configuration | ErrorKind::Serialization | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = Self::status_for(err.kind);

        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }

        let body = ApiErrorResponse {
            error: err.kind.to_string(),
            message: err.message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::status_for(ErrorKind::UserAlreadyExists),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::status_for(ErrorKind::InvalidCredentials),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::status_for(ErrorKind::SessionInvalidated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::status_for(ErrorKind::ServiceUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::status_for(ErrorKind::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError(AppError::session_invalidated()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
