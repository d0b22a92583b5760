//! Chorus Server
//!
//! Accepts sync connections, enforces one active session per username, and
//! persists each user's canonical library snapshot plus an append-only
//! version history of every snapshot it overwrites.

pub mod config;
pub mod error;
pub mod registry;
pub mod server;
pub mod session;
pub mod storage;
pub mod version;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use registry::{SessionGuard, SessionRegistry};
pub use server::SyncServer;
pub use session::SessionState;
pub use storage::UserStorage;
pub use version::{VersionEntry, VersionLog, VersionStore};
