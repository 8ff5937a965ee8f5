// src/core/errors.rs

//! Defines the primary error type for the entire client.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the client.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connect timeout reached before the transport was established")]
    ConnectTimeout,

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Connection ended: the retry strategy declined further attempts")]
    ConnectionEnded,

    #[error("A connection attempt is already in progress")]
    AlreadyConnecting,

    #[error("Connection is already established")]
    AlreadyReady,

    #[error("NOAUTH Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Setup command '{command}' failed: {message}")]
    BootstrapCommandFailed { command: String, message: String },

    #[error("{0}")]
    Server(String),

    #[error("Offline queue reached its configured limit")]
    OfflineQueueFull,

    #[error("Command result was already settled")]
    ReplyAlreadySettled,

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Internal Client Error: {0}")]
    Internal(String),
}

impl PartialEq for ClientError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ClientError::Io(e1), ClientError::Io(e2)) => e1.to_string() == e2.to_string(),
            (ClientError::Transport(s1), ClientError::Transport(s2)) => s1 == s2,
            (ClientError::AuthenticationFailed(s1), ClientError::AuthenticationFailed(s2)) => {
                s1 == s2
            }
            (
                ClientError::BootstrapCommandFailed {
                    command: c1,
                    message: m1,
                },
                ClientError::BootstrapCommandFailed {
                    command: c2,
                    message: m2,
                },
            ) => c1 == c2 && m1 == m2,
            (ClientError::Server(s1), ClientError::Server(s2)) => s1 == s2,
            (ClientError::Protocol(s1), ClientError::Protocol(s2)) => s1 == s2,
            (ClientError::Internal(s1), ClientError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(Arc::new(e))
    }
}

impl From<String> for ClientError {
    fn from(s: String) -> Self {
        ClientError::Transport(s)
    }
}
