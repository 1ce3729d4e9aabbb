//! Server Error Types
//!
//! [`Error`] covers starting and running the server itself. Failures while
//! handling a single request are turned into an [`ApiError`] instead, which
//! renders as a JSON body of the form `{"detail": "..."}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error};

/// A server error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Could not listen on the configured address.
    #[display("unable to bind to {_0}")]
    Bind(#[error(not(source))] String),
    /// A managed directory could not be opened.
    #[display("invalid data directory: {_0}")]
    DataDir(#[error(not(source))] String),
    /// The server stopped unexpectedly.
    #[display("server error")]
    Serve,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Bind(_))
    }
}

/// An error response for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}
impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status, detail: detail.into() }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Bind("0.0.0.0:8000".into()).to_string(), "unable to bind to 0.0.0.0:8000");
        assert!(ErrorKind::Bind(String::new()).is_retryable());
        assert!(!ErrorKind::Serve.is_retryable());
    }

    #[test]
    fn api_error_status() {
        assert_eq!(ApiError::bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status, StatusCode::NOT_FOUND);
        let response = ApiError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
