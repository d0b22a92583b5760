//! Chorus Wire Protocol
//!
//! The line-delimited header + binary-payload protocol shared by the Chorus
//! client and server.
//!
//! A message is one ASCII header line `KEY:VALUE\n`, optionally followed by a
//! binary payload whose exact byte length a preceding header declared. No
//! payload is read before its length is known, a reader never reads past the
//! declared length, and payload boundaries are never assumed to align with
//! transport chunk boundaries.
//!
//! Every read and write carries a deadline; a stalled peer surfaces as
//! [`ProtocolError::Timeout`], which callers treat like a protocol violation.

mod connection;
mod error;
pub mod message;

pub use connection::Connection;
pub use error::{ProtocolError, Result};
