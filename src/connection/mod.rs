// src/connection/mod.rs

//! Manages the lifecycle of a logical connection: the caller-facing handle,
//! the state machine driver, and the injectable transport boundary.

// Declare the sub-modules of the `connection` module.
mod client;
mod driver;
mod pipeline;
mod state;
mod transport;

// Publicly re-export the primary types from the sub-modules.
// This creates a clean public API for the `connection` module, hiding the
// internal file structure from the rest of the crate.
pub use client::Client;
pub use pipeline::Pipeline;
pub use state::ConnectionStatus;
pub use transport::{CommandSink, Connector, ReplyStream, TransportPair};
