//! Chorus Core
//!
//! Domain types and error handling shared by the Chorus client and server.
//!
//! This crate defines:
//! - **Domain Types**: `Song`, `Playlist`, `LibrarySnapshot`
//! - **Snapshot Document**: the JSON document moved over the wire and
//!   persisted by the server
//! - **Error Handling**: unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use chorus_core::LibrarySnapshot;
//!
//! let mut library = LibrarySnapshot::default();
//! let id = library
//!     .add_song("Clocks", "Coldplay", 307, "Alternative", "clocks.mp3")
//!     .unwrap();
//!
//! library.create_playlist("Morning");
//! library.playlist_mut("morning").unwrap().add_song(id);
//! ```

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use types::{LibrarySnapshot, Playlist, Song};
