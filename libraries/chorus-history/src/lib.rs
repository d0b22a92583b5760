//! Chorus Edit History
//!
//! Client-side undo/redo over library snapshots.
//!
//! The history records a deep copy of the full [`LibrarySnapshot`] after each
//! effective edit and keeps a movable cursor over the recorded states.
//! Registering a new state while the cursor is not at the tail discards every
//! state after the cursor: redo information is lost on a divergent edit.
//!
//! The history is purely in-memory and per-process. It is created fresh for
//! each sync session and discarded after the final upload.
//!
//! # Example
//!
//! ```rust
//! use chorus_core::LibrarySnapshot;
//! use chorus_history::EditHistory;
//!
//! let mut library = LibrarySnapshot::default();
//! let mut history = EditHistory::new();
//! history.initialize(&library);
//!
//! library.add_song("Clocks", "Coldplay", 307, "Alternative", "clocks.mp3");
//! history.register(&library);
//!
//! library = history.undo().unwrap();
//! assert!(library.songs.is_empty());
//! ```

use chorus_core::LibrarySnapshot;
use thiserror::Error;
use tracing::debug;

/// Result type alias using `HistoryError`
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors reported by [`EditHistory`]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HistoryError {
    /// The cursor was asked to move past an end of the history.
    ///
    /// Recoverable: the cursor does not move and the history is unchanged.
    #[error("history boundary reached: {0}")]
    Boundary(&'static str),
}

/// Undo/redo history over library snapshots.
///
/// Stored as an ordered sequence of snapshot copies plus a cursor index; a
/// non-empty history always has the cursor on a valid entry.
#[derive(Debug, Default)]
pub struct EditHistory {
    states: Vec<LibrarySnapshot>,
    cursor: usize,
}

impl EditHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the history holds no states
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of recorded states
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Discard any existing history and seed it with a single copy of
    /// `state` (typically the state right after the initial download).
    pub fn initialize(&mut self, state: &LibrarySnapshot) {
        self.states.clear();
        self.states.push(state.clone());
        self.cursor = 0;
        debug!("history initialized");
    }

    /// Record a new state after an effective edit.
    ///
    /// If the history is empty this behaves as [`initialize`](Self::initialize).
    /// If the cursor is not at the tail, every state after the cursor is
    /// discarded first; the new state is then appended and becomes current.
    pub fn register(&mut self, state: &LibrarySnapshot) {
        if self.states.is_empty() {
            self.initialize(state);
            return;
        }

        if self.cursor + 1 < self.states.len() {
            let dropped = self.states.len() - self.cursor - 1;
            self.states.truncate(self.cursor + 1);
            debug!(dropped, "discarded redo states on divergent edit");
        }

        self.states.push(state.clone());
        self.cursor = self.states.len() - 1;
    }

    /// Whether a state exists before the current one
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether a state exists after the current one
    pub fn can_redo(&self) -> bool {
        !self.states.is_empty() && self.cursor + 1 < self.states.len()
    }

    /// Move the cursor one state back and return a copy of that state.
    ///
    /// The returned snapshot is safe to adopt as the new live state.
    pub fn undo(&mut self) -> Result<LibrarySnapshot> {
        if !self.can_undo() {
            return Err(HistoryError::Boundary("no earlier state to undo to"));
        }
        self.cursor -= 1;
        Ok(self.states[self.cursor].clone())
    }

    /// Move the cursor one state forward and return a copy of that state.
    pub fn redo(&mut self) -> Result<LibrarySnapshot> {
        if !self.can_redo() {
            return Err(HistoryError::Boundary("no later state to redo to"));
        }
        self.cursor += 1;
        Ok(self.states[self.cursor].clone())
    }

    /// The state under the cursor, if any
    pub fn current(&self) -> Option<&LibrarySnapshot> {
        self.states.get(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_songs(titles: &[&str]) -> LibrarySnapshot {
        let mut library = LibrarySnapshot::default();
        for title in titles {
            library.add_song(*title, "Artist", 60, "Genre", format!("{title}.mp3"));
        }
        library
    }

    #[test]
    fn empty_history_has_no_moves() {
        let mut history = EditHistory::new();
        assert!(history.is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_err());
        assert!(history.redo().is_err());
        assert!(history.current().is_none());
    }

    #[test]
    fn register_on_empty_history_initializes() {
        let mut history = EditHistory::new();
        let a = snapshot_with_songs(&["a"]);
        history.register(&a);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), Some(&a));
        assert!(!history.can_undo());
    }

    #[test]
    fn consecutive_registers_undo_in_reverse_order() {
        let s1 = snapshot_with_songs(&["a"]);
        let s2 = snapshot_with_songs(&["a", "b"]);
        let s3 = snapshot_with_songs(&["a", "b", "c"]);
        let s4 = snapshot_with_songs(&["a", "b", "c", "d"]);

        let mut history = EditHistory::new();
        for s in [&s1, &s2, &s3, &s4] {
            history.register(s);
        }

        assert_eq!(history.undo().unwrap(), s3);
        assert_eq!(history.undo().unwrap(), s2);
        assert_eq!(history.undo().unwrap(), s1);
        assert_eq!(
            history.undo(),
            Err(HistoryError::Boundary("no earlier state to undo to"))
        );
        // Failed undo leaves the cursor in place
        assert_eq!(history.current(), Some(&s1));
    }

    #[test]
    fn register_after_undo_discards_redo_states() {
        let a = snapshot_with_songs(&["a"]);
        let b = snapshot_with_songs(&["a", "b"]);
        let c = snapshot_with_songs(&["a", "c"]);

        let mut history = EditHistory::new();
        history.initialize(&a);
        history.register(&b);

        assert_eq!(history.undo().unwrap(), a);
        history.register(&c);

        // The discarded forward state (b) is unreachable
        assert!(!history.can_redo());
        assert!(history.redo().is_err());
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), Some(&c));
    }

    #[test]
    fn add_then_remove_scenario_walks_both_ways() {
        // Client holds snapshot A; an add produces B; a playlist removal
        // produces C.
        let mut live = snapshot_with_songs(&["one"]);
        live.create_playlist("Mix");
        let a = live.clone();

        let mut history = EditHistory::new();
        history.initialize(&a);

        live.add_song("two", "Artist", 60, "Genre", "two.mp3");
        let b = live.clone();
        history.register(&b);

        live.delete_playlist("Mix");
        let c = live.clone();
        history.register(&c);

        assert_eq!(history.undo().unwrap(), b);
        assert_eq!(history.undo().unwrap(), a);
        assert!(!history.can_undo());
        assert_eq!(history.redo().unwrap(), b);
        assert!(history.can_redo());
    }

    #[test]
    fn registered_states_do_not_alias_the_live_snapshot() {
        let mut live = snapshot_with_songs(&["a"]);
        let mut history = EditHistory::new();
        history.initialize(&live);

        // Mutating the live snapshot must not change the recorded state
        live.songs[0].title = "mutated".to_string();
        assert_eq!(history.current().unwrap().songs[0].title, "a");
    }

    #[test]
    fn initialize_discards_previous_history() {
        let a = snapshot_with_songs(&["a"]);
        let b = snapshot_with_songs(&["b"]);

        let mut history = EditHistory::new();
        history.initialize(&a);
        history.register(&b);
        history.initialize(&a);

        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
