//! Per-user on-disk layout.
//!
//! Each user owns one flat directory under the configured data root:
//! `library.json` (the canonical snapshot, overwritten on each sync),
//! `manifest.json` plus `library-*.json` version history entries (see
//! [`crate::version`]), and the user's audio files stored alongside them.
use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Canonical snapshot file name
pub const CANONICAL_FILE: &str = "library.json";

/// Handle to one user's storage directory.
#[derive(Debug, Clone)]
pub struct UserStorage {
    dir: PathBuf,
}

impl UserStorage {
    /// Open (creating if needed) the directory for `username`.
    pub async fn open(data_dir: &Path, username: &str) -> Result<Self> {
        let dir = data_dir.join(username);
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// The user's directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the canonical snapshot file
    pub fn canonical_path(&self) -> PathBuf {
        self.dir.join(CANONICAL_FILE)
    }

    /// Read the canonical snapshot document, or `None` if none exists yet.
    pub async fn load_canonical(&self) -> Result<Option<String>> {
        let path = self.canonical_path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path).await?))
    }

    /// Overwrite the canonical snapshot document.
    pub async fn store_canonical(&self, document: &str) -> Result<()> {
        fs::write(self.canonical_path(), document).await?;
        Ok(())
    }

    /// Every audio file in the user's directory, in name order.
    pub async fn audio_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_audio_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Whether `path` names an audio file the sync protocol transfers.
pub fn is_audio_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canonical_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let storage = UserStorage::open(temp.path(), "ana").await.unwrap();

        assert!(storage.load_canonical().await.unwrap().is_none());
        storage.store_canonical("{\"songs\":[]}").await.unwrap();
        assert_eq!(
            storage.load_canonical().await.unwrap().unwrap(),
            "{\"songs\":[]}"
        );
    }

    #[tokio::test]
    async fn audio_files_skips_metadata_and_history() {
        let temp = tempfile::tempdir().unwrap();
        let storage = UserStorage::open(temp.path(), "ana").await.unwrap();
        let dir = storage.dir().to_path_buf();

        std::fs::write(dir.join("b.mp3"), b"b").unwrap();
        std::fs::write(dir.join("a.MP3"), b"a").unwrap();
        std::fs::write(dir.join("library.json"), b"{}").unwrap();
        std::fs::write(dir.join("manifest.json"), b"{}").unwrap();
        std::fs::write(dir.join("notes.txt"), b"n").unwrap();

        let files = storage.audio_files().await.unwrap();
        assert_eq!(files, vec![dir.join("a.MP3"), dir.join("b.mp3")]);
    }
}
