//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::ServiceError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed path, query or body
    BadRequest(String),
    /// Failure reported by the service layer
    Service(ServiceError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Service(ServiceError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Service(ServiceError::Conflict { .. }) => StatusCode::CONFLICT,
            AppError::Service(ServiceError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            AppError::Service(ServiceError::Internal { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::BadRequest(msg) => ApiError::new("BAD_REQUEST", msg),
            AppError::Service(err) => match err {
                ServiceError::NotFound { entity } => {
                    ApiError::new("NOT_FOUND", err.to_string()).with_details(entity.as_str())
                }
                ServiceError::Conflict { reason } => {
                    ApiError::new("CONFLICT", reason.as_str())
                }
                ServiceError::InvalidInput { reason } => {
                    ApiError::new("INVALID_INPUT", reason.as_str())
                }
                ServiceError::Internal { step, ref source } => {
                    // Storage detail stays in the logs
                    tracing::error!(step, error = %source, "request failed");
                    ApiError::new("INTERNAL_ERROR", "internal server error")
                }
            },
        };

        (status, Json(error)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::RepositoryError;
    use crate::models::Entity;
    use crate::services::{ConflictReason, InvalidReason};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::Service(ServiceError::not_found(Entity::Profile)),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Service(ServiceError::conflict(ConflictReason::UsernameInUse)),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Service(ServiceError::invalid(InvalidReason::SelfFollow)),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Service(ServiceError::Internal {
                    step: "insert user",
                    source: RepositoryError::connection("refused"),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
