//! services/api/src/error.rs
//!
//! Defines the error types for the API service: `ApiError` for startup
//! failures and `RequestError` for failures answered over HTTP.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use question_paper_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

/// Failures of a single HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Credential exchange failed; the provider's message is passed through.
    #[error("{0}")]
    Authentication(String),
    #[error("Not authenticated")]
    MissingToken,
    #[error("Invalid authentication token")]
    TokenInvalid,
    #[error("Paper not found")]
    NotFound,
    #[error("Access denied")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    /// The detail is logged, never sent to the client.
    #[error("Internal server error")]
    Internal(String),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Authentication(_)
            | RequestError::MissingToken
            | RequestError::TokenInvalid => StatusCode::UNAUTHORIZED,
            RequestError::NotFound => StatusCode::NOT_FOUND,
            RequestError::Forbidden => StatusCode::FORBIDDEN,
            RequestError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RequestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortError> for RequestError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(_) => RequestError::NotFound,
            PortError::Forbidden => RequestError::Forbidden,
            PortError::Unauthorized => RequestError::TokenInvalid,
            PortError::AuthenticationFailed(message) => RequestError::Authentication(message),
            PortError::Unexpected(detail) => RequestError::Internal(detail),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        if let RequestError::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }

        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_http_statuses() {
        let cases = [
            (PortError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PortError::Forbidden, StatusCode::FORBIDDEN),
            (PortError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                PortError::AuthenticationFailed("User does not exist".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (PortError::Unexpected("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (port_error, status) in cases {
            assert_eq!(RequestError::from(port_error).status(), status);
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = RequestError::from(PortError::Unexpected("s3 credentials expired".into()));

        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn provider_text_is_passed_through() {
        let err = RequestError::from(PortError::AuthenticationFailed(
            "Incorrect username or password".into(),
        ));

        assert_eq!(err.to_string(), "Incorrect username or password");
    }
}
