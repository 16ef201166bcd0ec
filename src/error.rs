//! Unified API error handling
//!
//! Every failure is reported as `{"status": "error", "errors": [...]}` with
//! one entry per problem, the same shape field validation uses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::policy::accept::AcceptError;
use crate::policy::{PolicyError, ValidationError};
use crate::services::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("Policy configuration error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub errors: Vec<ValidationError>,
}

impl ErrorResponse {
    pub fn single(location: &'static str, name: &str, description: impl Into<String>) -> Self {
        Self {
            status: "error",
            errors: vec![ValidationError {
                location,
                name: name.to_string(),
                description: description.into(),
            }],
        }
    }
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Policy(_) | Self::Internal(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(self) -> ErrorResponse {
        match self {
            Self::Validation(errors) => ErrorResponse {
                status: "error",
                errors,
            },
            Self::Unauthorized(msg) => ErrorResponse::single("header", "Authorization", msg),
            Self::Forbidden(msg) => ErrorResponse::single("url", "permission", msg),
            Self::NotFound(msg) => ErrorResponse::single("url", "id", msg),
            Self::BadRequest(msg) => ErrorResponse::single("body", "data", msg),
            Self::Conflict(msg) => ErrorResponse::single("body", "rev", msg),
            // Don't leak internal error details
            Self::Policy(_) | Self::Internal(_) | Self::Database(_) => {
                ErrorResponse::single("body", "data", "An internal error occurred")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Policy(e) => {
                tracing::error!(error = %e, "Policy configuration error");
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "Database error");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        (status, Json(self.body())).into_response()
    }
}

impl From<AcceptError> for ApiError {
    fn from(err: AcceptError) -> Self {
        match err {
            AcceptError::Invalid(errors) => Self::Validation(errors),
            AcceptError::Policy(e) => Self::Policy(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(format!("Tender {} not found", id)),
            StoreError::Conflict { .. } => {
                Self::Conflict("Tender was modified concurrently, retry the request".to_string())
            }
            StoreError::Corrupt(e) => Self::Internal(e.into()),
            StoreError::Database(e) => Self::Database(e),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::Validation(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(StoreError::Conflict {
                id: "t1".into(),
                expected: 3
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AcceptError::Policy(PolicyError::UnknownRole {
                table: crate::policy::EntityKind::Tender,
                role: "edit_x".into()
            }))
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let body = ApiError::Internal(anyhow::anyhow!("connection refused")).body();
        assert_eq!(body.errors[0].description, "An internal error occurred");
    }
}
