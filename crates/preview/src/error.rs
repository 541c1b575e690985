//! Preview client errors.

use thiserror::Error;

/// Errors that can occur when talking to the Folio admin API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the credentials or token (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized,

    /// The site is locked for maintenance (HTTP 503).
    #[error("Site is in maintenance mode")]
    Maintenance,

    /// The requested record does not exist or is not visible (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status, with the server's `error` message.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// HTTP request failed before a response arrived.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to build a request URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Whether the error means the presented token is not (or no longer)
    /// valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
