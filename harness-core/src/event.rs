//! The uniform outgoing event envelope (§3).

use serde::{Deserialize, Serialize};

/// Token/cost accounting for a completed query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens produced.
    pub output_tokens: u64,
    /// Tokens served from cache, if the backend reports it.
    pub cache_read_tokens: Option<u64>,
    /// Tokens written to cache, if the backend reports it.
    pub cache_write_tokens: Option<u64>,
    /// Cost in US dollars, if computed.
    pub cost_usd: Option<f64>,
    /// Wall-clock duration from streamer start to child exit, in
    /// milliseconds.
    pub duration_ms: Option<u64>,
}

/// The closed error-code taxonomy of §7.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The caller's backend is not installed (surfaced pre-stream, not as
    /// an event, but shares this taxonomy).
    NotInstalled,
    /// Authentication with the backend failed.
    AuthFailed,
    /// The caller tripped the abort signal.
    Aborted,
    /// The backend reported a rate limit.
    RateLimited,
    /// The backend reported a context-window overflow.
    ContextOverflow,
    /// The child process crashed, failed to spawn, or exited non-zero
    /// without usage.
    ProcessCrashed,
    /// A configured timeout elapsed.
    Timeout,
    /// An unclassified backend failure.
    Unknown,
}

/// The uniform outgoing event stream item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Emitted exactly once, the first time the child reports its
    /// session/thread identifier.
    SessionStarted {
        /// The backend-minted session/thread id.
        session_id: String,
    },
    /// A raw backend event, carried opaquely.
    Message {
        /// The backend's event, verbatim.
        message: serde_json::Value,
    },
    /// A trimmed, non-empty stderr line.
    Stderr {
        /// The stderr line's content.
        data: String,
    },
    /// A classified failure.
    Error {
        /// Human-readable error text.
        error: String,
        /// The classified error code.
        code: ErrorCode,
    },
    /// Terminal: the query completed. At most one per stream.
    Complete {
        /// Usage/cost accounting, when available.
        usage: Option<Usage>,
    },
}

impl Event {
    /// `true` for the two terminal event shapes (`Complete`, and `Error`
    /// with code `Aborted`).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. })
            || matches!(self, Self::Error { code: ErrorCode::Aborted, .. })
    }
}
