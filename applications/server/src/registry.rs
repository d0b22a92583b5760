//! Active-session registry.
//!
//! At most one session may hold a given username at any instant. The claim is
//! a single atomic check-and-insert under one mutex, and release happens in
//! [`SessionGuard::drop`], so an aborted session can never leak its lock.
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Shared table of usernames with an active session.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim exclusive ownership of `username`.
    ///
    /// Returns `None` if the username already has an active session; the
    /// rejection changes nothing.
    pub fn claim(&self, username: &str) -> Option<SessionGuard> {
        let mut active = self.active.lock().expect("session registry poisoned");
        if !active.insert(username.to_string()) {
            warn!(%username, "login rejected, session already active");
            return None;
        }
        debug!(%username, "session lock acquired");
        Some(SessionGuard {
            username: username.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    /// Whether `username` currently holds a session
    pub fn is_active(&self, username: &str) -> bool {
        self.active
            .lock()
            .expect("session registry poisoned")
            .contains(username)
    }

    /// Number of currently active sessions
    pub fn active_count(&self) -> usize {
        self.active.lock().expect("session registry poisoned").len()
    }
}

/// Exclusive ownership of one username for the lifetime of one session.
#[derive(Debug)]
pub struct SessionGuard {
    username: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl SessionGuard {
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .expect("session registry poisoned")
            .remove(&self.username);
        debug!(username = %self.username, "session lock released");
    }
}
