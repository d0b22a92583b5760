/// Playlist domain type
use serde::{Deserialize, Serialize};

/// An ordered playlist of song ids.
///
/// Names are unique case-insensitively within one snapshot (enforced by
/// [`crate::LibrarySnapshot`]). A playlist may reference an id whose song has
/// since been removed from an older snapshot; readers tolerate such dangling
/// references rather than repairing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Playlist name
    pub name: String,

    /// Ordered song ids, no duplicates
    pub song_ids: Vec<u32>,
}

impl Playlist {
    /// Create an empty playlist
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            song_ids: Vec::new(),
        }
    }

    /// Append a song id if it is not already present.
    ///
    /// Returns `false` if the id was already in the playlist.
    pub fn add_song(&mut self, song_id: u32) -> bool {
        if self.song_ids.contains(&song_id) {
            return false;
        }
        self.song_ids.push(song_id);
        true
    }

    /// Remove a song id.
    ///
    /// Returns `false` if the id was not in the playlist.
    pub fn remove_song(&mut self, song_id: u32) -> bool {
        let before = self.song_ids.len();
        self.song_ids.retain(|&id| id != song_id);
        self.song_ids.len() != before
    }

    /// Whether the playlist contains the given song id
    pub fn contains(&self, song_id: u32) -> bool {
        self.song_ids.contains(&song_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_song_rejects_duplicates() {
        let mut playlist = Playlist::new("Gym");
        assert!(playlist.add_song(3));
        assert!(!playlist.add_song(3));
        assert_eq!(playlist.song_ids, vec![3]);
    }

    #[test]
    fn remove_song_reports_presence() {
        let mut playlist = Playlist::new("Gym");
        playlist.add_song(1);
        playlist.add_song(2);
        assert!(playlist.remove_song(1));
        assert!(!playlist.remove_song(1));
        assert_eq!(playlist.song_ids, vec![2]);
    }
}
