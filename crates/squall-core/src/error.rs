//! Error types for squall-core

use thiserror::Error;

/// Result type alias for squall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the squall HTTP stack
#[derive(Debug, Error)]
pub enum Error {
    /// Request line did not split into method, path, version
    #[error("Malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// Invalid HTTP method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Request exceeded the configured size cap
    #[error("Request too large: {size} bytes exceeds limit of {limit} bytes")]
    RequestTooLarge { size: usize, limit: usize },

    /// Handler failure, surfaced as a JSON error envelope by dispatch
    #[error("Handler error: {0}")]
    Handler(String),

    /// Read or connect exceeded the configured timeout
    #[error("I/O timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for handler failures raised inside dynamic routes.
    pub fn handler(msg: impl Into<String>) -> Self {
        Error::Handler(msg.into())
    }
}
