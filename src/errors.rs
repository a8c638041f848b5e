use crate::db::errors::DbError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided, or credentials invalid
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated user does not own the requested resource
    #[error("{message}")]
    NotOwner { message: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    Validation { message: String },

    /// Requested resource not found
    #[error("{message}")]
    NotFound { message: String },

    /// Conflict with existing state, e.g. a taken username
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Rate limit exceeded
    #[error("Too many requests: {message}")]
    TooManyRequests { message: String },

    /// A storage operation exceeded its deadline
    #[error("Timed out while {operation}")]
    StoreTimeout { operation: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::NotOwner { .. } => StatusCode::UNAUTHORIZED,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::StoreTimeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "User not authenticated".to_string()),
            Error::NotOwner { message } => message.clone(),
            Error::Validation { message } => message.clone(),
            Error::NotFound { message } => message.clone(),
            Error::Conflict { message } => message.clone(),
            Error::TooManyRequests { message } => message.clone(),
            Error::StoreTimeout { .. } => "An unknown error occurred".to_string(),
            Error::Internal { .. } => "An unknown error occurred".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::Other(_) => "An unknown error occurred".to_string(),
            },
            Error::Other(_) => "An unknown error occurred".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::StoreTimeout { .. } | Error::Internal { .. } | Error::Database(DbError::Other(_)) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::NotOwner { .. } => {
                tracing::debug!("Authentication error: {}", self);
            }
            Error::Validation { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::TooManyRequests { .. } => {
                tracing::debug!("Rate limited: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({ "data": { "error": self.user_message() } });

        (status, axum::response::Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

/// JSON body extractor whose rejections go through [`Error`], so malformed
/// bodies produce the same response shape as every other failure instead of
/// axum's plain-text default.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::Validation {
                message: rejection.body_text(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::Unauthenticated { message: None }.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::NotOwner {
                message: "You cannot access this note".to_string()
            }
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::Validation {
                message: "Parameters missing".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound {
                message: "note not found".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Conflict {
                message: "taken".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::TooManyRequests {
                message: "slow down".to_string()
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            Error::StoreTimeout {
                operation: "loading notes".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthenticated_default_message() {
        let err = Error::Unauthenticated { message: None };
        assert_eq!(err.user_message(), "User not authenticated");

        let err = Error::Unauthenticated {
            message: Some("Invalid Credentials".to_string()),
        };
        assert_eq!(err.user_message(), "Invalid Credentials");
    }

    #[test]
    fn test_internal_errors_never_leak_details() {
        let err = Error::Internal {
            operation: "connect to postgres at 10.0.0.3".to_string(),
        };
        assert_eq!(err.user_message(), "An unknown error occurred");

        let err = Error::StoreTimeout {
            operation: "deleting session".to_string(),
        };
        assert_eq!(err.user_message(), "An unknown error occurred");

        let err = Error::Other(anyhow::anyhow!("secret detail"));
        assert_eq!(err.user_message(), "An unknown error occurred");
    }
}
