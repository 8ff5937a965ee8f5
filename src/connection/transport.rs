// src/connection/transport.rs

//! The boundary between the connection core and the wire.
//!
//! The core never touches bytes or sockets. A [`Connector`] is the injectable
//! capability that produces a live transport; the transport itself is a pair
//! of halves so the driver can keep the write half while a reader task pumps
//! decoded replies back through the driver's mailbox.

use crate::core::ClientError;
use crate::core::protocol::RespValue;
use async_trait::async_trait;
use bytes::Bytes;

/// The write half of an established transport: accepts one command at a
/// time, already broken into a name and its argument byte-strings. Encoding
/// to the wire format is the implementation's concern.
#[async_trait]
pub trait CommandSink: Send {
    async fn send(&mut self, name: &str, args: &[Bytes]) -> Result<(), ClientError>;

    /// Politely closes the transport. Errors are ignored by the driver; the
    /// transport is gone either way.
    async fn shutdown(&mut self) -> Result<(), ClientError>;
}

/// The read half of an established transport: yields decoded replies in wire
/// order. `Ok(None)` signals a clean close by the peer.
#[async_trait]
pub trait ReplyStream: Send {
    async fn next_reply(&mut self) -> Result<Option<RespValue>, ClientError>;
}

/// A freshly opened transport, split into its two halves.
pub struct TransportPair {
    pub sink: Box<dyn CommandSink>,
    pub stream: Box<dyn ReplyStream>,
}

/// Opens transports. One `open` call corresponds to one connection attempt;
/// the core treats the connector as opaque and owns all retry policy.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn open(&self) -> Result<TransportPair, ClientError>;
}
