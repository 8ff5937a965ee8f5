// src/connection/client.rs

//! The caller-facing handle for a logical connection.
//!
//! A `Client` is a cheap, cloneable handle over the driver task's mailbox.
//! Dropping the last handle shuts the driver down.

use crate::config::Config;
use crate::connection::driver::{ApiRequest, Driver, DriverMessage};
use crate::connection::pipeline::Pipeline;
use crate::connection::state::ConnectionStatus;
use crate::connection::transport::Connector;
use crate::core::command::Command;
use crate::core::errors::ClientError;
use crate::core::events::{ClientEvent, EventBus, PushMessage};
use crate::core::protocol::RespValue;
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_stream::wrappers::BroadcastStream;

/// The error reported when the driver task is gone (every handle was
/// dropped, or the runtime shut down underneath it).
pub(crate) fn driver_gone() -> ClientError {
    ClientError::Internal("connection driver terminated".to_string())
}

/// The state shared by every clone of a [`Client`]. Dropping the last clone
/// tells the driver to shut down; the driver cannot learn this from its
/// mailbox closing, because its own pump tasks hold sender clones.
struct ClientInner {
    tx: mpsc::UnboundedSender<DriverMessage>,
    shared_status: Arc<RwLock<ConnectionStatus>>,
    events: Arc<EventBus>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        let _ = self.tx.send(DriverMessage::Api(ApiRequest::Shutdown));
    }
}

/// A handle to a resilient logical connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a client and spawns its connection driver.
    ///
    /// Unless `lazy_connect` is set, the first connection attempt starts
    /// immediately; its outcome is observable through lifecycle events or an
    /// explicit [`Client::connect`] call.
    pub fn new(config: Config, connector: Arc<dyn Connector>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared_status = Arc::new(RwLock::new(ConnectionStatus::Wait));
        let events = Arc::new(EventBus::new());
        let lazy = config.lazy_connect;

        let driver = Driver::new(
            config,
            connector,
            rx,
            tx.clone(),
            shared_status.clone(),
            events.clone(),
        );
        tokio::spawn(driver.run());

        let client = Self {
            inner: Arc::new(ClientInner {
                tx,
                shared_status,
                events,
            }),
        };
        if !lazy {
            let _ = client
                .inner
                .tx
                .send(DriverMessage::Api(ApiRequest::Connect { ack: None }));
        }
        client
    }

    /// Connects (or reconnects after `end`), resolving once the connection
    /// reaches `ready`.
    ///
    /// Fails with `AlreadyReady` / `AlreadyConnecting` on caller misuse, or
    /// with the connection error when the first attempt fails and the retry
    /// strategy declines to continue. One call settles exactly once no
    /// matter how many internal reconnect cycles it spans.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let (ack, rx) = oneshot::channel();
        self.send(ApiRequest::Connect { ack: Some(ack) })?;
        rx.await.map_err(|_| driver_gone())?
    }

    /// Tears the connection down. With `reconnect = false` the client goes
    /// to `end` and every queued command is rejected; with `reconnect = true`
    /// the client behaves as though the transport failed and reconnects,
    /// keeping queued commands.
    pub fn disconnect(&self, reconnect: bool) {
        let _ = self.send(ApiRequest::Disconnect { reconnect });
    }

    /// Sends QUIT through the normal delivery path and resolves with the
    /// server's `OK`. Called before any connection attempt, it resolves
    /// immediately without opening a transport.
    pub async fn quit(&self) -> Result<String, ClientError> {
        match self.quit_value().await? {
            RespValue::SimpleString(s) => Ok(s),
            RespValue::BulkString(b) => String::from_utf8(b.to_vec())
                .map_err(|_| ClientError::Protocol("non-UTF8 QUIT reply".to_string())),
            other => Err(ClientError::Protocol(format!(
                "unexpected QUIT reply: {other:?}"
            ))),
        }
    }

    /// [`Client::quit`], but the reply is handed back as raw bytes.
    pub async fn quit_buffer(&self) -> Result<Bytes, ClientError> {
        let value = self.quit_value().await?;
        value
            .as_bytes()
            .ok_or_else(|| ClientError::Protocol(format!("unexpected QUIT reply: {value:?}")))
    }

    async fn quit_value(&self) -> Result<RespValue, ClientError> {
        let (ack, rx) = oneshot::channel();
        self.send(ApiRequest::Quit { ack })?;
        rx.await.map_err(|_| driver_gone())?
    }

    /// Submits a named command and resolves with its reply.
    ///
    /// Depending on the connection status the command is written
    /// immediately, queued for replay, or rejected; see the crate docs for
    /// the full table.
    pub async fn command(
        &self,
        name: impl Into<String>,
        args: Vec<Bytes>,
    ) -> Result<RespValue, ClientError> {
        let (command, rx) = Command::new(name, args);
        self.send(ApiRequest::Submit { command })?;
        rx.await.map_err(|_| driver_gone())?
    }

    pub async fn subscribe(&self, channels: Vec<Bytes>) -> Result<RespValue, ClientError> {
        self.command("SUBSCRIBE", channels).await
    }

    pub async fn unsubscribe(&self, channels: Vec<Bytes>) -> Result<RespValue, ClientError> {
        self.command("UNSUBSCRIBE", channels).await
    }

    pub async fn psubscribe(&self, patterns: Vec<Bytes>) -> Result<RespValue, ClientError> {
        self.command("PSUBSCRIBE", patterns).await
    }

    pub async fn punsubscribe(&self, patterns: Vec<Bytes>) -> Result<RespValue, ClientError> {
        self.command("PUNSUBSCRIBE", patterns).await
    }

    /// Starts an ordered command batch.
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.clone())
    }

    /// The current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.shared_status.read()
    }

    /// Subscribes to lifecycle events. Events are delivered in publish
    /// order, synchronously with the transition that caused them.
    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Lifecycle events as a `Stream`.
    pub fn event_stream(&self) -> BroadcastStream<ClientEvent> {
        BroadcastStream::new(self.inner.events.subscribe())
    }

    /// Subscribes to pub/sub message deliveries.
    pub fn messages(&self) -> broadcast::Receiver<PushMessage> {
        self.inner.events.subscribe_messages()
    }

    /// Message deliveries as a `Stream`.
    pub fn message_stream(&self) -> BroadcastStream<PushMessage> {
        BroadcastStream::new(self.inner.events.subscribe_messages())
    }

    pub(crate) fn send(&self, request: ApiRequest) -> Result<(), ClientError> {
        self.inner
            .tx
            .send(DriverMessage::Api(request))
            .map_err(|_| driver_gone())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("status", &self.status())
            .finish()
    }
}
