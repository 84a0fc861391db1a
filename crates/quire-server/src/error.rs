//! Error types for the server and publisher.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use quire_core::CoreError;
use quire_store::StoreError;

/// Errors that can occur while serving or publishing.
#[derive(Debug, Error)]
pub enum ServerError {
    /// An update arrived with no outstanding challenge.
    #[error("no challenge issued")]
    NoChallenge,

    /// The update failed authentication, decoding, or hash verification.
    #[error("not authorized")]
    NotAuthorized,

    /// Core codec error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking worker panicked or was cancelled.
    #[error("worker error: {0}")]
    Worker(String),

    /// Transport or unexpected-status error talking to a server.
    #[error("HTTP error: {0}")]
    Http(String),
}

impl ServerError {
    /// HTTP status for this error at the request boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NoChallenge | ServerError::NotAuthorized => StatusCode::FORBIDDEN,
            ServerError::Core(CoreError::Entropy(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Core(_) => StatusCode::FORBIDDEN,
            ServerError::Store(StoreError::NotFound(_) | StoreError::NoEntries) => {
                StatusCode::NOT_FOUND
            }
            ServerError::Http(_) => StatusCode::BAD_GATEWAY,
            ServerError::Store(_)
            | ServerError::Config(_)
            | ServerError::Io(_)
            | ServerError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(e: reqwest::Error) -> Self {
        ServerError::Http(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        // Rejections carry no detail.
        let body = match status {
            StatusCode::FORBIDDEN => String::new(),
            StatusCode::NOT_FOUND => self.to_string(),
            _ => "internal error".to_string(),
        };
        (status, body).into_response()
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_forbidden() {
        for e in [
            ServerError::NoChallenge,
            ServerError::NotAuthorized,
            ServerError::Core(CoreError::InvalidHash),
            ServerError::Core(CoreError::Decode("bad".into())),
            ServerError::Core(CoreError::Crypto("bad".into())),
        ] {
            assert_eq!(e.status(), StatusCode::FORBIDDEN, "{e}");
        }
    }

    #[test]
    fn test_store_status() {
        assert_eq!(
            ServerError::Store(StoreError::NoEntries).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Store(StoreError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Store(StoreError::Persistence("disk".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::Worker("panicked".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
