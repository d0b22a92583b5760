/// Song domain type
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A song in the user's library.
///
/// `audio_file` holds the bare file name of the backing audio file, never a
/// full path. The file itself lives in the per-user directory on whichever
/// side (client or server) currently holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Identifier, unique within one snapshot
    pub id: u32,

    /// Song title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Duration in seconds
    pub duration_secs: u32,

    /// Genre
    pub genre: String,

    /// Bare file name of the audio file
    pub audio_file: String,
}

impl Song {
    /// Create a new song, normalizing `audio_file` to a bare file name.
    pub fn new(
        id: u32,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_secs: u32,
        genre: impl Into<String>,
        audio_file: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            duration_secs,
            genre: genre.into(),
            audio_file: normalize_audio_file(&audio_file.into()),
        }
    }

    /// Strip any directory components that may have crept into `audio_file`.
    pub fn normalize(&mut self) {
        self.audio_file = normalize_audio_file(&self.audio_file);
    }
}

/// Reduce a path-like string to its final component.
pub(crate) fn normalize_audio_file(raw: &str) -> String {
    Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
