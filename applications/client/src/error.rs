/// Client error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the login because the username already has an
    /// active session. The sync attempt ends cleanly with no state change.
    #[error("user {0} already has an active session, try again later")]
    SessionRejected(String),

    /// The server deviated from the protocol, stalled, or hung up
    #[error("Protocol error: {0}")]
    Protocol(#[from] chorus_protocol::ProtocolError),

    /// Snapshot document handling failed
    #[error("Snapshot error: {0}")]
    Core(#[from] chorus_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the sync was refused (as opposed to having failed)
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::SessionRejected(_))
    }
}
