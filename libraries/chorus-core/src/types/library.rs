/// Library snapshot: the complete serializable state of one user's library
use crate::error::Result;
use crate::types::{Playlist, Song};
use serde::{Deserialize, Serialize};

/// A complete copy of one user's songs and playlists at one instant.
///
/// This is the unit the sync protocol transports and the server persists.
/// Once a snapshot has been encoded for transport or storage it is treated
/// as immutable; further local edits happen on a clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    /// All songs, in insertion order
    #[serde(default)]
    pub songs: Vec<Song>,

    /// All playlists, in creation order
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

impl LibrarySnapshot {
    /// Encode the snapshot as the wire/storage document.
    ///
    /// Every `audio_file` is normalized to a bare file name before encoding,
    /// so a document never leaks local directory structure.
    pub fn to_document(&self) -> Result<String> {
        let mut snapshot = self.clone();
        for song in &mut snapshot.songs {
            song.normalize();
        }
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Decode a snapshot from the wire/storage document.
    ///
    /// Playlist entries referencing unknown song ids are kept as-is; the
    /// document is never repaired on read.
    pub fn from_document(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    // Song operations

    /// Register a new song.
    ///
    /// Rejects an existing (title, artist) pair. The id is assigned as one
    /// more than the current maximum (1 for an empty library) and is never
    /// reused within a run even after deletions leave gaps.
    ///
    /// Returns the new id, or `None` if the song already exists.
    pub fn add_song(
        &mut self,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_secs: u32,
        genre: impl Into<String>,
        audio_file: impl Into<String>,
    ) -> Option<u32> {
        let title = title.into();
        let artist = artist.into();

        if self
            .songs
            .iter()
            .any(|s| s.title == title && s.artist == artist)
        {
            return None;
        }

        let id = self.songs.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        self.songs
            .push(Song::new(id, title, artist, duration_secs, genre, audio_file));
        Some(id)
    }

    /// Update every field of an existing song.
    ///
    /// Returns `false` if no song has the given id.
    pub fn edit_song(
        &mut self,
        id: u32,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_secs: u32,
        genre: impl Into<String>,
        audio_file: impl Into<String>,
    ) -> bool {
        match self.songs.iter_mut().find(|s| s.id == id) {
            Some(song) => {
                *song = Song::new(id, title, artist, duration_secs, genre, audio_file);
                true
            }
            None => false,
        }
    }

    /// Remove a song and strip its id from every playlist.
    ///
    /// Returns `false` if no song has the given id.
    pub fn remove_song(&mut self, id: u32) -> bool {
        let before = self.songs.len();
        self.songs.retain(|s| s.id != id);
        if self.songs.len() == before {
            return false;
        }
        for playlist in &mut self.playlists {
            playlist.remove_song(id);
        }
        true
    }

    /// Look up a song by id
    pub fn song(&self, id: u32) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    // Playlist operations (names match case-insensitively)

    /// Create a new empty playlist.
    ///
    /// Returns `false` if a playlist with the same name (ignoring case)
    /// already exists.
    pub fn create_playlist(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.playlist(&name).is_some() {
            return false;
        }
        self.playlists.push(Playlist::new(name));
        true
    }

    /// Delete a playlist by name.
    ///
    /// Returns `false` if no playlist matches.
    pub fn delete_playlist(&mut self, name: &str) -> bool {
        let before = self.playlists.len();
        self.playlists
            .retain(|p| !p.name.eq_ignore_ascii_case(name));
        self.playlists.len() != before
    }

    /// Look up a playlist by name
    pub fn playlist(&self, name: &str) -> Option<&Playlist> {
        self.playlists
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Look up a playlist by name, mutably
    pub fn playlist_mut(&mut self, name: &str) -> Option<&mut Playlist> {
        self.playlists
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
