//! Client sync engine.
use crate::error::{ClientError, Result};
use chorus_core::LibrarySnapshot;
use chorus_history::EditHistory;
use chorus_protocol::{message, Connection, ProtocolError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Client-side sync settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub username: String,

    /// Root directory for per-user local copies
    pub local_dir: PathBuf,

    /// Deadline applied to connecting and to every protocol read and write
    pub io_timeout: Duration,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            local_dir: PathBuf::from("./chorus-data"),
            io_timeout: Duration::from_secs(30),
        }
    }

    /// The directory holding this user's local library copy
    pub fn user_dir(&self) -> PathBuf {
        self.local_dir.join(&self.username)
    }
}

/// What one sync session moved.
#[derive(Debug)]
pub struct SyncReport {
    /// Audio files received from the server
    pub downloaded_files: usize,

    /// Audio files sent back (every local audio file, changed or not)
    pub uploaded_files: usize,

    /// The library state that was uploaded as the new canonical snapshot
    pub library: LibrarySnapshot,
}

/// Drives one complete sync session against the server.
pub struct SyncEngine {
    config: ClientConfig,
}

impl SyncEngine {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Run a full sync: login, download, edit, upload, logout.
    ///
    /// `edit` receives the live snapshot and a fresh undo/redo history
    /// seeded with the downloaded state; whatever the snapshot holds when
    /// the callback returns is uploaded as the new canonical state. The
    /// history is discarded afterwards.
    ///
    /// Returns [`ClientError::SessionRejected`] if the username already has
    /// an active session; nothing is changed locally or remotely in that
    /// case.
    pub async fn sync<F>(&self, edit: F) -> Result<SyncReport>
    where
        F: FnOnce(&mut LibrarySnapshot, &mut EditHistory),
    {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!(%addr, username = %self.config.username, "connecting");

        let stream = tokio::time::timeout(self.config.io_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ProtocolError::Timeout)?
            .map_err(ProtocolError::Io)?;
        let mut conn = Connection::new(stream, self.config.io_timeout);

        // Login
        conn.send_header(message::LOGIN, &self.config.username)
            .await?;
        let reply = conn.read_message().await?;
        match reply.as_str() {
            message::OK => {}
            message::REJECTED => {
                info!(username = %self.config.username, "login rejected");
                return Err(ClientError::SessionRejected(self.config.username.clone()));
            }
            other => {
                return Err(ProtocolError::Violation(format!(
                    "expected OK or REJECTED, got {other:?}"
                ))
                .into())
            }
        }

        // Download the canonical snapshot and audio files
        let document = conn.recv_document(message::METADATA_SIZE).await?;
        let mut library = LibrarySnapshot::from_document(&document)?;

        let user_dir = self.config.user_dir();
        tokio::fs::create_dir_all(&user_dir).await?;

        let downloaded = conn.read_count(message::NUM_MP3).await?;
        for _ in 0..downloaded {
            conn.recv_file(&user_dir).await?;
        }
        info!(
            songs = library.songs.len(),
            playlists = library.playlists.len(),
            files = downloaded,
            "library downloaded"
        );

        // Local edits; the history records a state per effective edit and
        // lives only until the upload below
        let mut history = EditHistory::new();
        history.initialize(&library);
        edit(&mut library, &mut history);

        // Upload the (possibly edited) snapshot
        let edited_document = library.to_document()?;
        conn.send_line(message::UPLOAD_METADATA).await?;
        conn.send_document(message::SIZE, &edited_document).await?;

        // Re-upload every local audio file, changed or not
        let uploads = local_audio_files(&user_dir).await?;
        conn.send_header(message::NUM_MP3, uploads.len()).await?;
        for file in &uploads {
            debug!(file = %file.display(), "uploading audio file");
            conn.send_file(file).await?;
        }

        conn.send_line(message::LOGOUT).await?;
        info!(files = uploads.len(), "library synchronized");

        Ok(SyncReport {
            downloaded_files: downloaded as usize,
            uploaded_files: uploads.len(),
            library,
        })
    }
}

/// Every audio file in the local user directory, in name order.
async fn local_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_mp3 = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"));
        if is_mp3 {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
