//! Typed API errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use compute::ComputeError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{} with id {} not found", entity, id))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Database(db_error) => match db_error.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    (StatusCode::CONFLICT, "DUPLICATE_ENTRY")
                }
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    (StatusCode::BAD_REQUEST, "INVALID_REFERENCE")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<ComputeError> for ApiError {
    fn from(err: ComputeError) -> Self {
        match err {
            ComputeError::Database(db_error) => ApiError::Database(db_error),
            ComputeError::NotFound { entity, id } => ApiError::not_found(entity, id),
            ComputeError::InvalidSemester(semester) => {
                ApiError::Validation(format!("Invalid semester '{}'", semester))
            }
            ComputeError::Validation(message) => ApiError::Validation(message),
            ComputeError::Conflict(message) => ApiError::Conflict(message),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Database details stay in the log
        let message = match &self {
            ApiError::Database(db_error) if status.is_server_error() => {
                error!("Database error: {}", db_error);
                "Internal database error".to_string()
            }
            ApiError::Database(db_error) => {
                warn!("Rejected by database constraint: {}", db_error);
                match code {
                    "DUPLICATE_ENTRY" => "A record with the same unique value already exists",
                    _ => "A referenced record does not exist",
                }
                .to_string()
            }
            other if status.is_server_error() => {
                error!("{}", other);
                other.to_string()
            }
            other => {
                warn!("Request failed with {}: {}", status, other);
                other.to_string()
            }
        };

        let body = ErrorResponse {
            success: false,
            message,
            code: code.to_string(),
            error: None,
        };
        (status, Json(body)).into_response()
    }
}
