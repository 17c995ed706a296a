use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

/// Error kinds surfaced by the messaging engine.
///
/// Every engine operation propagates one of these to its caller; the HTTP
/// adapter maps them onto status codes through `From<MessagingError> for AppError`.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Bad input shape (e.g. fewer than two participants, empty body)
    #[error("validation failed: {0}")]
    Validation(String),

    /// A policy denied the action
    #[error("not allowed: {0}")]
    Authorization(String),

    /// A referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The sender reached the rolling 24h quota
    #[error("daily messaging limit of {limit} messages reached for this sender")]
    QuotaExceeded { limit: u32 },

    /// A storage uniqueness rule rejected a concurrent write
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl MessagingError {
    pub fn validation(details: impl Into<String>) -> Self {
        Self::Validation(details.into())
    }

    pub fn authorization(details: impl Into<String>) -> Self {
        Self::Authorization(details.into())
    }

    pub fn not_found(details: impl Into<String>) -> Self {
        Self::NotFound(details.into())
    }

    pub fn conflict(details: impl Into<String>) -> Self {
        Self::Conflict(details.into())
    }
}

impl From<sqlx::Error> for MessagingError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource not found"),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Self::conflict(db_err.message().to_string())
            }
            other => Self::Database(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: &'static str,
    details: Option<String>,
}

impl AppError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    // Common error constructors
    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: &'static str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: &'static str) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn precondition_failed(message: &'static str) -> Self {
        Self::new(StatusCode::PRECONDITION_FAILED, message)
    }

    pub fn internal_server_error(message: &'static str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: &'static str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource not found"),

            sqlx::Error::Database(_) => Self::internal_server_error("Database error"),

            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::service_unavailable("Database unavailable")
            }

            _ => Self::internal_server_error("Internal server error"),
        }
    }
}

impl From<MessagingError> for AppError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::Validation(details) => {
                Self::bad_request("Validation error").with_details(details)
            }
            MessagingError::Authorization(details) => {
                Self::forbidden("Permission denied").with_details(details)
            }
            MessagingError::NotFound(details) => {
                Self::not_found("Resource not found").with_details(details)
            }
            MessagingError::QuotaExceeded { limit } => {
                Self::precondition_failed("Daily messaging limit reached")
                    .with_details(format!("A sender may post at most {} messages per 24 hours", limit))
            }
            MessagingError::Conflict(details) => Self::conflict("Conflict").with_details(details),
            MessagingError::Database(err) => Self::from(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::bad_request("Validation error").with_details(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorResponse {
            error: self.message,
            details: self.details,
        });
        (self.status, body).into_response()
    }
}
