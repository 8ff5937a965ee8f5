// src/core/command.rs

//! The in-flight representation of a submitted command.

use crate::core::errors::ClientError;
use crate::core::protocol::RespValue;
use crate::core::subscriptions::{AckOp, SubscriptionKind};
use bytes::Bytes;
use tokio::sync::oneshot;

/// The outcome delivered to a command's pending result.
pub type CommandResult = Result<RespValue, ClientError>;

/// Where a command came from, which decides how its reply is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    /// Submitted by a caller; the reply settles the caller's future.
    User,
    /// Issued by the session bootstrapper. Replies are consumed internally.
    /// A fatal failure (AUTH) terminates the connection; others are surfaced
    /// as `error` events without blocking readiness.
    Bootstrap { fatal: bool },
    /// A subscription-restoration command issued after reconnect.
    Resubscribe,
    /// The QUIT command; its success transitions the client to `end`.
    Quit,
}

/// A named command with its arguments and single-assignment pending result.
///
/// A command lives in exactly one place at a time: the offline queue, or the
/// in-flight queue once written to the transport. Its result is resolved at
/// most once; replay paths that reach an already-settled command get
/// `ReplyAlreadySettled` back instead of silently double-resolving.
#[derive(Debug)]
pub struct Command {
    pub name: String,
    pub args: Vec<Bytes>,
    pub origin: CommandOrigin,
    /// Push acknowledgements still expected before this command resolves.
    /// Zero for everything except subscription commands; assigned when the
    /// command is written to the transport.
    pub expected_acks: u32,
    /// Logical submission index, assigned by the queue.
    pub seq: u64,
    responder: Option<oneshot::Sender<CommandResult>>,
}

impl Command {
    /// Creates a caller-facing command together with the receiver for its
    /// pending result.
    pub fn new(
        name: impl Into<String>,
        args: Vec<Bytes>,
    ) -> (Self, oneshot::Receiver<CommandResult>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                name: name.into(),
                args,
                origin: CommandOrigin::User,
                expected_acks: 0,
                seq: 0,
                responder: Some(tx),
            },
            rx,
        )
    }

    /// Creates a command whose reply is consumed internally.
    pub fn internal(name: impl Into<String>, args: Vec<Bytes>, origin: CommandOrigin) -> Self {
        Self {
            name: name.into(),
            args,
            origin,
            expected_acks: 0,
            seq: 0,
            responder: None,
        }
    }

    /// Attaches an explicit responder, used for QUIT and pipeline commands.
    pub fn with_responder(
        name: impl Into<String>,
        args: Vec<Bytes>,
        origin: CommandOrigin,
        responder: oneshot::Sender<CommandResult>,
    ) -> Self {
        Self {
            name: name.into(),
            args,
            origin,
            expected_acks: 0,
            seq: 0,
            responder: Some(responder),
        }
    }

    /// Resolves the pending result exactly once.
    ///
    /// A dropped receiver is not an error (the caller gave up waiting); a
    /// second resolution attempt is.
    pub fn resolve(&mut self, result: CommandResult) -> Result<(), ClientError> {
        match self.responder.take() {
            Some(tx) => {
                let _ = tx.send(result);
                Ok(())
            }
            None if self.origin == CommandOrigin::User || self.origin == CommandOrigin::Quit => {
                Err(ClientError::ReplyAlreadySettled)
            }
            // Internal commands never had a responder to begin with.
            None => Ok(()),
        }
    }

    /// True once the pending result has been settled (or never existed).
    pub fn is_settled(&self) -> bool {
        self.responder.is_none()
    }

    /// The subscription-set mutation this command acknowledges with, if it is
    /// a subscription command.
    pub fn subscription_op(&self) -> Option<(SubscriptionKind, AckOp)> {
        match self.name.to_ascii_uppercase().as_str() {
            "SUBSCRIBE" => Some((SubscriptionKind::Channel, AckOp::Add)),
            "UNSUBSCRIBE" => Some((SubscriptionKind::Channel, AckOp::Remove)),
            "PSUBSCRIBE" => Some((SubscriptionKind::Pattern, AckOp::Add)),
            "PUNSUBSCRIBE" => Some((SubscriptionKind::Pattern, AckOp::Remove)),
            _ => None,
        }
    }
}
