/// Server error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The peer broke the protocol; terminal for that connection only
    #[error("Protocol error: {0}")]
    Protocol(#[from] chorus_protocol::ProtocolError),

    /// Snapshot document handling failed
    #[error("Snapshot error: {0}")]
    Core(#[from] chorus_core::CoreError),

    /// Disk state could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
