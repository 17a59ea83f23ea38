//! Server error types.

use thiserror::Error;

/// Errors raised while running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// An I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A handler requested process shutdown; the connection is dropped
    /// without a response.
    #[error("shutdown requested by handler")]
    ShutdownRequested,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::Bind("address in use".to_string());
        assert_eq!(err.to_string(), "bind error: address in use");
        assert!(ServerError::ShutdownRequested.to_string().contains("shutdown"));
    }
}
