//! Wire message vocabulary.
//!
//! Header keys and bare control lines used by the sync protocol. A header
//! value is everything after the first `:` on the line, so values themselves
//! may contain `:`. Values may not contain a newline; senders reject them.

/// Client login request header: `LOGIN:<username>`
pub const LOGIN: &str = "LOGIN";

/// Server accepts the login
pub const OK: &str = "OK";

/// Server rejects the login because the username has an active session
pub const REJECTED: &str = "REJECTED";

/// Size header preceding the server's snapshot document download
pub const METADATA_SIZE: &str = "METADATA_SIZE";

/// Count header preceding a run of audio file transfers
pub const NUM_MP3: &str = "NUM_MP3";

/// Size header of one audio file payload
pub const MP3_SIZE: &str = "MP3_SIZE";

/// Name header of one audio file (bare file name)
pub const MP3_NAME: &str = "MP3_NAME";

/// Client announces the snapshot upload phase
pub const UPLOAD_METADATA: &str = "UPLOAD_METADATA";

/// Size header preceding the client's snapshot document upload
pub const SIZE: &str = "SIZE";

/// Client ends the session
pub const LOGOUT: &str = "LOGOUT";

/// Longest accepted header line, including the terminating newline
pub const MAX_HEADER_LINE: usize = 8 * 1024;

/// Chunk size for streaming file payloads
pub const CHUNK_SIZE: usize = 8 * 1024;
