//! Chorus Client
//!
//! Drives the sync protocol from the client side: login, download the
//! canonical snapshot and audio files, hand the live snapshot to an edit
//! callback (recording states in the undo/redo history), then upload the
//! edited snapshot and local audio files back to the server.

pub mod error;
pub mod sync;

pub use error::{ClientError, Result};
pub use sync::{ClientConfig, SyncEngine, SyncReport};
