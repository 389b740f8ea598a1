use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use jobscout_core::error::AppError;

use crate::dto::ErrorResponse;

/// Wrapper so we can implement `IntoResponse` for `AppError`.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AppError::InvalidQuery(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            e if e.is_fatal() => (StatusCode::SERVICE_UNAVAILABLE, "browser_unavailable"),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.0.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}
