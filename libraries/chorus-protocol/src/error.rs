/// Protocol error types
use thiserror::Error;

/// Result type alias using `ProtocolError`
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while speaking the sync protocol.
///
/// Everything here is terminal for the connection it occurred on: the session
/// aborts, the username lock is released, and nothing is retried.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The peer deviated from the required message order or framing
    #[error("protocol violation: {0}")]
    Violation(String),

    /// The peer stalled past the configured deadline
    #[error("peer did not respond within the deadline")]
    Timeout,

    /// The peer closed the connection mid-exchange
    #[error("connection closed unexpectedly")]
    ConnectionClosed,

    /// Transport or file I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Create a protocol violation error
    pub fn violation(msg: impl Into<String>) -> Self {
        Self::Violation(msg.into())
    }
}
