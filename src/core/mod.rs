// src/core/mod.rs

//! The central module containing the core logic and data structures of the
//! client: errors, the command/queue model, retry policy, session bootstrap,
//! subscription tracking, and the event bus.

pub mod bootstrap;
pub mod command;
pub mod errors;
pub mod events;
pub mod protocol;
pub mod queue;
pub mod retry;
pub mod subscriptions;

pub use command::{Command, CommandOrigin, CommandResult};
pub use errors::ClientError;
pub use protocol::RespValue;
