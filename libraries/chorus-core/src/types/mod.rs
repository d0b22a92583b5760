mod library;
mod playlist;
mod song;

pub use library::LibrarySnapshot;
pub use playlist::Playlist;
pub use song::Song;
