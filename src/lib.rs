// src/lib.rs

pub mod config;
pub mod connection;
pub mod core;

// Re-export
pub use crate::config::Config;
pub use crate::connection::{
    Client, CommandSink, ConnectionStatus, Connector, Pipeline, ReplyStream, TransportPair,
};
pub use crate::core::command::CommandResult;
pub use crate::core::errors::ClientError;
pub use crate::core::events::{ClientEvent, PushMessage};
pub use crate::core::protocol::RespValue;
pub use crate::core::retry::{RetryContext, RetryStrategy};
