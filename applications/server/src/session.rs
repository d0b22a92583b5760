//! Per-connection session handling.
//!
//! One session is one connection for one username, executed as a strict
//! message sequence; any deviation is a protocol violation that aborts the
//! connection. The username lock is held by a [`SessionGuard`] for the whole
//! session and released on drop, so every exit path (clean logout, protocol
//! violation, storage failure, timeout) gives the name back.
use crate::error::Result;
use crate::registry::SessionRegistry;
use crate::storage::UserStorage;
use crate::version::VersionStore;
use chorus_core::LibrarySnapshot;
use chorus_protocol::{message, Connection, ProtocolError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info};

/// Protocol position of one session.
///
/// `LoggedOut` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AuthPending,
    Authenticated,
    MetadataSent,
    FilesSent,
    AwaitingUpload,
    MetadataReceived,
    FilesReceived,
    LoggedOut,
    Error,
}

/// How a session ended without a server-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Full sync sequence ran to `LOGOUT`
    Completed,
    /// Login was refused because the username already had a session
    Rejected,
}

/// Drives the server side of the sync protocol for each connection.
pub struct SessionHandler {
    registry: SessionRegistry,
    versions: Arc<VersionStore>,
    data_dir: PathBuf,
    io_timeout: Duration,
}

impl SessionHandler {
    pub fn new(
        registry: SessionRegistry,
        versions: Arc<VersionStore>,
        data_dir: PathBuf,
        io_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            versions,
            data_dir,
            io_timeout,
        }
    }

    /// Run one full session over `stream`.
    ///
    /// Errors are terminal for this connection only; other sessions are
    /// unaffected and nothing is retried or rolled back.
    pub async fn handle<S>(&self, stream: S) -> Result<SessionOutcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut conn = Connection::new(stream, self.io_timeout);
        let mut state = SessionState::AuthPending;

        let username = conn.read_value(message::LOGIN).await?;
        validate_username(&username)?;

        let Some(guard) = self.registry.claim(&username) else {
            conn.send_line(message::REJECTED).await?;
            return Ok(SessionOutcome::Rejected);
        };

        conn.send_line(message::OK).await?;
        advance(&mut state, SessionState::Authenticated, &username);

        // The guard outlives the whole exchange; dropping it on any path
        // below releases the username lock.
        let result = self.run(&mut conn, &username, &mut state).await;
        drop(guard);

        match result {
            Ok(()) => {
                info!(%username, "session completed");
                Ok(SessionOutcome::Completed)
            }
            Err(e) => {
                state = SessionState::Error;
                error!(%username, state = ?state, error = %e, "session aborted");
                Err(e)
            }
        }
    }

    async fn run<S>(
        &self,
        conn: &mut Connection<S>,
        username: &str,
        state: &mut SessionState,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let storage = UserStorage::open(&self.data_dir, username).await?;

        // Send the canonical snapshot, defaulting to an empty library
        let canonical = storage.load_canonical().await?;
        let document = match &canonical {
            Some(doc) => doc.clone(),
            None => LibrarySnapshot::default().to_document()?,
        };
        conn.send_document(message::METADATA_SIZE, &document).await?;
        advance(state, SessionState::MetadataSent, username);

        // Send every audio file the user has
        let files = storage.audio_files().await?;
        conn.send_header(message::NUM_MP3, files.len()).await?;
        for file in &files {
            conn.send_file(file).await?;
        }
        advance(state, SessionState::FilesSent, username);
        advance(state, SessionState::AwaitingUpload, username);

        // Receive the new canonical snapshot
        conn.expect_line(message::UPLOAD_METADATA).await?;
        let uploaded = conn.recv_document(message::SIZE).await?;
        LibrarySnapshot::from_document(&uploaded).map_err(|e| {
            ProtocolError::Violation(format!("uploaded metadata is not a library snapshot: {e}"))
        })?;

        // Archive the previous canonical document before overwriting it
        if let Some(previous) = canonical.as_deref().filter(|doc| !doc.is_empty()) {
            self.versions.archive(username, previous).await?;
        }
        storage.store_canonical(&uploaded).await?;
        advance(state, SessionState::MetadataReceived, username);

        // Receive uploaded audio files alongside the canonical snapshot
        let count = conn.read_count(message::NUM_MP3).await?;
        for _ in 0..count {
            conn.recv_file(storage.dir()).await?;
        }
        advance(state, SessionState::FilesReceived, username);

        conn.expect_line(message::LOGOUT).await?;
        advance(state, SessionState::LoggedOut, username);
        Ok(())
    }
}

fn advance(state: &mut SessionState, next: SessionState, username: &str) {
    debug!(%username, from = ?*state, to = ?next, "session state");
    *state = next;
}

/// Usernames become directory names, so they are restricted to a safe set.
fn validate_username(username: &str) -> Result<()> {
    let ok = !username.is_empty()
        && username.len() <= 64
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && username != "."
        && username != "..";
    if ok {
        Ok(())
    } else {
        Err(ProtocolError::Violation(format!("unusable username {username:?}")).into())
    }
}
