//! Unified error handling with Sentry integration.
//!
//! API handlers return `Result<T, AppError>`. Every error body is JSON of the
//! form `{"error": "..."}`; server-side details are logged and captured to
//! Sentry, never sent to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::AuthError;
use crate::store::StoreError;

/// Application-level error type for the HTTP surface.
#[derive(Debug, Error)]
pub enum AppError {
    /// No token, unknown token or expired token. Deliberately generic.
    #[error("Unauthorized")]
    Unauthorized,

    /// Site-wide lockout and no valid bypass token.
    #[error("Site is in maintenance mode")]
    Maintenance,

    /// Credential check failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Storage backend failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Endpoint intentionally disabled.
    #[error("{0}")]
    Gone(&'static str),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::Auth(AuthError::InvalidCredentials) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Auth(_) | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gone(_) => StatusCode::GONE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Never exposes internal details.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(AuthError::Misconfigured(_)) => "Server configuration error".to_string(),
            Self::Store(StoreError::Conflict(what)) => format!("Already exists: {what}"),
            Self::Auth(_) | Self::Store(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::NotFound(_) => "Not found".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Unauthorized | Self::Maintenance | Self::Gone(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() && !matches!(self, Self::Maintenance) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::Misconfigured("ADMIN_EMAIL")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Maintenance.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            AppError::Store(StoreError::Unavailable("down".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Store(StoreError::Conflict("post".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Gone("Diagnostics disabled").status(), StatusCode::GONE);
        assert_eq!(
            AppError::NotFound("post".to_string()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_messages_hide_internals() {
        assert_eq!(
            AppError::Auth(AuthError::Misconfigured("ADMIN_PASSWORD_HASH")).message(),
            "Server configuration error"
        );
        assert_eq!(
            AppError::Store(StoreError::Unavailable("10.0.0.5 refused".to_string())).message(),
            "Internal server error"
        );
        assert_eq!(AppError::Unauthorized.message(), "Unauthorized");
        assert_eq!(AppError::Maintenance.message(), "Site is in maintenance mode");
    }
}
