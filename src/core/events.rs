// src/core/events.rs

//! Defines the event bus for propagating connection lifecycle transitions
//! and pub/sub message deliveries to external observers.

use crate::core::errors::ClientError;
use bytes::Bytes;
use std::time::Duration;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::debug;

/// The capacity of the lifecycle event channel. Lifecycle transitions are
/// low-volume; a lagging subscriber loses the oldest events first.
const EVENT_BUS_CAPACITY: usize = 128;

/// The capacity of the pub/sub message channel.
const MESSAGE_BUS_CAPACITY: usize = 1024;

/// A connection lifecycle transition, published synchronously with the
/// transition that caused it.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The transport reported open; session bootstrap is about to run.
    Connect,
    /// Bootstrap completed; user traffic is flowing.
    Ready,
    /// A non-fatal or fatal failure with no single owning command.
    Error(ClientError),
    /// The transport was torn down.
    Close,
    /// A retry was scheduled after `delay`; `attempt` is the 1-based count
    /// of the upcoming attempt.
    Reconnecting { delay: Duration, attempt: u32 },
    /// Terminal: no further reconnect attempts will be made.
    End,
}

/// A pub/sub delivery pushed by the server outside the request/reply flow.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub channel: Bytes,
    /// Set when the delivery matched a pattern subscription.
    pub pattern: Option<Bytes>,
    pub payload: Bytes,
}

/// The distribution hub for lifecycle events and message deliveries.
///
/// Both channels are `broadcast`: every subscriber sees every item, in
/// publish order. Publishing with no subscribers is not an error.
#[derive(Debug)]
pub struct EventBus {
    event_sender: Sender<ClientEvent>,
    message_sender: Sender<PushMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        let (event_sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        let (message_sender, _) = broadcast::channel(MESSAGE_BUS_CAPACITY);
        Self {
            event_sender,
            message_sender,
        }
    }

    /// Publishes a lifecycle event. It's okay if nobody is listening.
    pub fn publish(&self, event: ClientEvent) {
        debug!("Lifecycle event: {:?}", event);
        if self.event_sender.send(event).is_err() {
            debug!("Published a lifecycle event with no active subscribers.");
        }
    }

    /// Publishes a pub/sub delivery.
    pub fn publish_message(&self, message: PushMessage) {
        if self.message_sender.send(message).is_err() {
            debug!("Dropped a pub/sub message with no active subscribers.");
        }
    }

    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        self.event_sender.subscribe()
    }

    pub fn subscribe_messages(&self) -> Receiver<PushMessage> {
        self.message_sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
