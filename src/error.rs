use crate::schemas::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use common::FieldErrors;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// One or more submitted fields are invalid
    #[error("Submitted data is invalid")]
    Validation(FieldErrors),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The named record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Failures of password hashing or token handling
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A validation error carrying a single field message.
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        ApiError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "RELATIONSHIP_EXISTS",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code().to_string();

        // Server-side details stay in the logs
        let message = if status.is_server_error() {
            error!(code = %code, "Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            warn!(code = %code, "Request rejected: {}", self);
            self.to_string()
        };

        let field_errors = match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        };

        let body = ErrorResponse {
            error: message,
            code,
            success: false,
            field_errors,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("Profile").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("exists".to_string()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::field("username", "taken").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Database(DbErr::Custom("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ApiError::NotFound("Profile").to_string(), "Profile not found");
    }
}
