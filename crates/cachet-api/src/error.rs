//! Error types for status-page and HTTP calls.

use thiserror::Error;

/// Result type alias for status-page operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur while talking to the status page (or probing a
/// target over HTTP).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("request build error: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("component {0} not found")]
    NotFound(u32),
}
