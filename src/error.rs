use std::time::Duration;
use thiserror::Error;

/// Errors raised by a transport client.
///
/// This is the error type of the [`Client`](crate::Client) and
/// [`AsyncClient`](crate::AsyncClient) contracts. The caching layer never
/// creates one itself: whatever the wrapped transport returns is handed to
/// the caller unchanged.
///
/// It is `Clone` because a shared response future hands its output, errors
/// included, to every caller holding it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("client is closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = TransportError> = std::result::Result<T, E>;
