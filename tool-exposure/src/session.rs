//! The `sessionId → transport` table of §4.4.
//!
//! A "transport" here is just the fact of the session's existence: this
//! server has no persistent per-session connection state beyond the
//! session id itself, so the table is a set rather than a map to an
//! object.

use std::collections::HashSet;
use tokio::sync::RwLock;

/// Tracks live session ids.
#[derive(Default)]
pub struct SessionTable {
    sessions: RwLock<HashSet<String>>,
}

impl SessionTable {
    /// Builds an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly-initialized session id.
    pub async fn insert(&self, session_id: String) {
        self.sessions.write().await.insert(session_id);
    }

    /// Returns whether `session_id` is known.
    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains(session_id)
    }

    /// Removes a session id, e.g. on `DELETE` or transport close.
    pub async fn remove(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Drops every tracked session. Used on server stop.
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}
