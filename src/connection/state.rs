// src/connection/state.rs

//! The connection status, one of which holds at any time.

use strum_macros::Display;

/// The public status of the logical connection.
///
/// Transitions are owned exclusively by the connection driver; everything
/// else observes the status through the shared accessor or lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    /// Lazy client, never connected.
    Wait,
    /// A transport-open attempt is in progress.
    Connecting,
    /// Transport open, session bootstrap not yet complete.
    Connect,
    /// Bootstrap complete, accepting traffic.
    Ready,
    /// Transport torn down; the reconnect decision has not been made yet.
    Close,
    /// A retry is scheduled.
    Reconnecting,
    /// Terminal: no further reconnect attempts.
    End,
}

impl ConnectionStatus {
    /// True while a `connect()` call would be caller misuse.
    pub fn is_connection_in_progress(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::Connecting | ConnectionStatus::Connect | ConnectionStatus::Ready
        )
    }
}
