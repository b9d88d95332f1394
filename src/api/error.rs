use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::{forecast::ForecastError, repo::RepoError};

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Prediction service error: {0}")]
    UpstreamError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Error response that gets serialized to JSON
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error type string
    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::InsufficientData(_) => "InsufficientData",
            ApiError::UpstreamError(_) => "UpstreamUnavailable",
            ApiError::InternalError(_) => "InternalServerError",
            ApiError::DatabaseError(_) => "DatabaseError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        let message = match &self {
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            ApiError::UpstreamError(_) => {
                tracing::warn!(error = %self, "prediction service failed");
                self.to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound(what) => ApiError::NotFound(what),
            RepoError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(error: ForecastError) -> Self {
        match error {
            ForecastError::InsufficientData { .. } | ForecastError::IncompleteReading { .. } => {
                ApiError::InsufficientData(error.to_string())
            }
            ForecastError::UpstreamUnavailable(_) | ForecastError::MalformedResponse(_) => {
                ApiError::UpstreamError(error.to_string())
            }
            ForecastError::DegenerateBounds { .. } => ApiError::InternalError(error.to_string()),
            ForecastError::Store(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InsufficientData("test".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::UpstreamError("test".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_forecast_error_mapping() {
        let e: ApiError = ForecastError::InsufficientData {
            required: 8,
            available: 7,
        }
        .into();
        assert_eq!(e.error_type(), "InsufficientData");

        let e: ApiError = ForecastError::MalformedResponse("x".into()).into();
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);

        let e: ApiError = ForecastError::Store(RepoError::Database("down".into())).into();
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_display() {
        let error = ApiError::NotFound("Sensor 123".to_string());
        assert_eq!(error.to_string(), "Resource not found: Sensor 123");
    }
}
