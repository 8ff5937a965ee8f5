// src/connection/driver.rs

//! The connection state machine.
//!
//! A single driver task owns every piece of mutable connection state: the
//! status, the command queues, the subscription set, the transport handles,
//! and the armed timers. Everything that can happen to a connection arrives
//! through one mailbox — API requests from client handles, decoded replies
//! and closure notices from the reader pump (tagged with the connection
//! epoch so stale transports can't confuse a newer one), and timer
//! expirations — so transitions never race each other.

use crate::config::Config;
use crate::connection::state::ConnectionStatus;
use crate::connection::transport::{CommandSink, Connector, ReplyStream, TransportPair};
use crate::core::bootstrap::SessionBootstrapper;
use crate::core::command::{Command, CommandOrigin, CommandResult};
use crate::core::errors::ClientError;
use crate::core::events::{ClientEvent, EventBus, PushMessage};
use crate::core::protocol::{PushFrame, RespValue, classify_push};
use crate::core::queue::CommandQueue;
use crate::core::retry::RetryContext;
use crate::core::subscriptions::{AckOp, SubscriptionKind, SubscriptionSet};
use bytes::Bytes;
use parking_lot::RwLock;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Sleep, sleep};
use tracing::{debug, error, info, warn};

/// A request from a client handle.
pub(crate) enum ApiRequest {
    Connect {
        /// Settled when the connection reaches `ready` or ends terminally.
        /// `None` for the implicit connect issued at construction.
        ack: Option<oneshot::Sender<Result<(), ClientError>>>,
    },
    Disconnect {
        reconnect: bool,
    },
    Quit {
        ack: oneshot::Sender<CommandResult>,
    },
    Submit {
        command: Command,
    },
    /// A pipeline: submitted as one ordered unit, with no other submissions
    /// interleaved.
    Batch {
        commands: Vec<Command>,
    },
    /// Sent when the last client handle is dropped. The driver would
    /// otherwise never observe a closed mailbox: its own pump tasks hold
    /// sender clones.
    Shutdown,
}

/// Everything the driver's mailbox can carry.
pub(crate) enum DriverMessage {
    Api(ApiRequest),
    /// Outcome of a transport-open attempt.
    Opened {
        epoch: u64,
        result: Result<TransportPair, ClientError>,
    },
    /// A decoded reply pumped from the transport's read half.
    Reply {
        epoch: u64,
        value: RespValue,
    },
    /// The transport's read half finished. `error` is `None` on a clean
    /// close by the peer.
    TransportClosed {
        epoch: u64,
        error: Option<ClientError>,
    },
}

/// What woke the driver loop up.
enum Tick {
    Message(Option<DriverMessage>),
    ConnectTimeout,
    RetryDue,
}

pub(crate) struct Driver {
    config: Config,
    connector: Arc<dyn Connector>,
    rx: mpsc::UnboundedReceiver<DriverMessage>,
    tx: mpsc::UnboundedSender<DriverMessage>,
    status: ConnectionStatus,
    shared_status: Arc<RwLock<ConnectionStatus>>,
    events: Arc<EventBus>,
    queue: CommandQueue,
    subscriptions: SubscriptionSet,
    /// 1-based count of connection attempts since the last `ready`.
    retry_attempts: u32,
    /// Bumped whenever the current transport (or pending open) is
    /// invalidated; messages carrying an older epoch are ignored.
    epoch: u64,
    sink: Option<Box<dyn CommandSink>>,
    reader: Option<JoinHandle<()>>,
    opener: Option<JoinHandle<()>>,
    retry_timer: Option<Pin<Box<Sleep>>>,
    connect_timer: Option<Pin<Box<Sleep>>>,
    connect_waiters: Vec<oneshot::Sender<Result<(), ClientError>>>,
    /// Setup commands written but not yet acknowledged on this connection.
    pending_bootstrap: usize,
    /// Restoration subscribe commands not yet fully acknowledged. User
    /// traffic holds until this reaches zero.
    pending_resubscribe: usize,
    last_error: Option<ClientError>,
    stopped: bool,
}

impl Driver {
    pub(crate) fn new(
        config: Config,
        connector: Arc<dyn Connector>,
        rx: mpsc::UnboundedReceiver<DriverMessage>,
        tx: mpsc::UnboundedSender<DriverMessage>,
        shared_status: Arc<RwLock<ConnectionStatus>>,
        events: Arc<EventBus>,
    ) -> Self {
        let queue = CommandQueue::new(config.offline_queue_limit);
        Self {
            config,
            connector,
            rx,
            tx,
            status: ConnectionStatus::Wait,
            shared_status,
            events,
            queue,
            subscriptions: SubscriptionSet::new(),
            retry_attempts: 0,
            epoch: 0,
            sink: None,
            reader: None,
            opener: None,
            retry_timer: None,
            connect_timer: None,
            connect_waiters: Vec::new(),
            pending_bootstrap: 0,
            pending_resubscribe: 0,
            last_error: None,
            stopped: false,
        }
    }

    /// The driver's main loop. Runs until every client handle is dropped.
    pub(crate) async fn run(mut self) {
        debug!("Connection driver started.");
        loop {
            let tick = {
                let rx = &mut self.rx;
                let connect_timer = &mut self.connect_timer;
                let retry_timer = &mut self.retry_timer;
                let connect_timer_armed = connect_timer.is_some();
                let retry_timer_armed = retry_timer.is_some();
                tokio::select! {
                    biased;
                    msg = rx.recv() => Tick::Message(msg),
                    _ = async { connect_timer.as_mut().unwrap().await }, if connect_timer_armed => {
                        Tick::ConnectTimeout
                    }
                    _ = async { retry_timer.as_mut().unwrap().await }, if retry_timer_armed => {
                        Tick::RetryDue
                    }
                }
            };

            match tick {
                Tick::Message(Some(msg)) => self.handle_message(msg).await,
                Tick::Message(None) => {
                    self.on_handles_dropped().await;
                    break;
                }
                Tick::ConnectTimeout => self.on_connect_timeout().await,
                Tick::RetryDue => self.on_retry_due().await,
            }
            if self.stopped {
                break;
            }
        }
        debug!("Connection driver terminated.");
    }

    async fn handle_message(&mut self, msg: DriverMessage) {
        match msg {
            DriverMessage::Api(request) => self.handle_api(request).await,
            DriverMessage::Opened { epoch, result } => self.on_opened(epoch, result).await,
            DriverMessage::Reply { epoch, value } => self.on_reply(epoch, value).await,
            DriverMessage::TransportClosed { epoch, error } => {
                if epoch == self.epoch {
                    info!("Transport closed{}.", match &error {
                        Some(e) => format!(" with error: {e}"),
                        None => " by peer".to_string(),
                    });
                    self.connection_lost(error).await;
                }
            }
        }
    }

    async fn handle_api(&mut self, request: ApiRequest) {
        match request {
            ApiRequest::Connect { ack } => self.on_connect_request(ack),
            ApiRequest::Disconnect { reconnect } => self.on_disconnect(reconnect).await,
            ApiRequest::Quit { ack } => self.on_quit(ack).await,
            ApiRequest::Submit { command } => self.submit(command).await,
            ApiRequest::Batch { commands } => {
                for command in commands {
                    self.submit(command).await;
                }
            }
            ApiRequest::Shutdown => {
                self.on_handles_dropped().await;
                self.stopped = true;
            }
        }
    }

    // --- connect / disconnect / quit ---

    fn on_connect_request(&mut self, ack: Option<oneshot::Sender<Result<(), ClientError>>>) {
        match self.status {
            ConnectionStatus::Ready => {
                if let Some(ack) = ack {
                    let _ = ack.send(Err(ClientError::AlreadyReady));
                }
            }
            status if status.is_connection_in_progress() => {
                if let Some(ack) = ack {
                    let _ = ack.send(Err(ClientError::AlreadyConnecting));
                }
            }
            // Wait, End, Close, or Reconnecting: (re)enter `connecting`.
            _ => {
                self.retry_timer = None;
                if matches!(self.status, ConnectionStatus::Wait | ConnectionStatus::End) {
                    // A fresh explicit connect starts a new retry cycle.
                    self.retry_attempts = 0;
                    self.last_error = None;
                }
                if let Some(ack) = ack {
                    self.connect_waiters.push(ack);
                }
                self.begin_connecting();
            }
        }
    }

    async fn on_disconnect(&mut self, reconnect: bool) {
        if reconnect {
            info!("Forced reconnect requested.");
            self.retry_timer = None;
            let had_transport = self.teardown_transport().await;
            if had_transport {
                self.events.publish(ClientEvent::Close);
            }
            if self.config.auto_resend_unfulfilled {
                self.queue.requeue_unfulfilled();
            } else {
                self.queue.reject_in_flight(&ClientError::ConnectionClosed);
            }
            self.set_status(ConnectionStatus::Reconnecting);
            self.events.publish(ClientEvent::Reconnecting {
                delay: Duration::ZERO,
                attempt: self.retry_attempts + 1,
            });
            self.retry_timer = Some(Box::pin(sleep(Duration::ZERO)));
        } else {
            info!("Disconnect requested; connection is ending.");
            self.retry_timer = None;
            let had_transport = self.teardown_transport().await;
            if had_transport {
                self.events.publish(ClientEvent::Close);
            }
            let error = ClientError::ConnectionClosed;
            self.queue.reject_all(&error);
            self.fail_connect_waiters(&error);
            if self.status != ConnectionStatus::End {
                self.set_status(ConnectionStatus::End);
                self.events.publish(ClientEvent::End);
            }
        }
    }

    async fn on_quit(&mut self, ack: oneshot::Sender<CommandResult>) {
        match self.status {
            // Never connected and no retry cycle started: resolve without
            // touching the connector or the retry strategy.
            ConnectionStatus::Wait if self.retry_attempts == 0 => {
                let _ = ack.send(Ok(RespValue::ok()));
                self.set_status(ConnectionStatus::End);
                self.events.publish(ClientEvent::End);
            }
            // Already ended: quitting again is a no-op success.
            ConnectionStatus::End => {
                let _ = ack.send(Ok(RespValue::ok()));
            }
            _ => {
                let command =
                    Command::with_responder("QUIT", Vec::new(), CommandOrigin::Quit, ack);
                self.submit(command).await;
            }
        }
    }

    // --- command submission ---

    async fn submit(&mut self, mut command: Command) {
        command.seq = self.queue.assign_seq();
        match self.status {
            ConnectionStatus::Ready if self.pending_resubscribe == 0 => {
                self.write_command(command).await;
            }
            ConnectionStatus::End => {
                if self.config.enable_offline_queue {
                    debug!(name = %command.name, "Connection ended; holding command until an explicit reconnect.");
                    self.queue_offline(command);
                } else {
                    let _ = command.resolve(Err(ClientError::ConnectionClosed));
                }
            }
            ConnectionStatus::Wait => {
                // First traffic on a lazy client starts the connection.
                self.queue_offline(command);
                self.begin_connecting();
            }
            _ => self.queue_offline(command),
        }
    }

    fn queue_offline(&mut self, command: Command) {
        if let Err(mut rejected) = self.queue.enqueue_offline(command) {
            warn!(name = %rejected.name, "Offline queue is full; rejecting command.");
            let _ = rejected.resolve(Err(ClientError::OfflineQueueFull));
        }
    }

    async fn write_command(&mut self, mut command: Command) {
        // Subscription commands resolve only after one acknowledgement per
        // name. The count is fixed at write time: for a bare UNSUBSCRIBE the
        // server acks once per currently tracked name, or once with a null
        // name when nothing is tracked.
        if let Some((kind, _)) = command.subscription_op()
            && command.expected_acks == 0
        {
            command.expected_acks = if command.args.is_empty() {
                self.subscriptions.count(kind).max(1) as u32
            } else {
                command.args.len() as u32
            };
        }

        let Some(sink) = self.sink.as_mut() else {
            // No usable transport despite the status; park the command for
            // the next flush rather than losing it.
            self.queue.requeue_front(command);
            return;
        };

        debug!(seq = command.seq, name = %command.name, "Writing command to transport.");
        match sink.send(&command.name, &command.args).await {
            Ok(()) => self.queue.push_in_flight(command),
            Err(e) => {
                warn!("Write failed: {e}. Tearing down transport.");
                self.queue.requeue_front(command);
                self.connection_lost(Some(e)).await;
            }
        }
    }

    /// Drains the offline queue onto the transport. Stops early if a write
    /// failure tears the connection down or restoration gating re-engages.
    async fn flush_offline(&mut self) {
        while self.status == ConnectionStatus::Ready
            && self.pending_resubscribe == 0
            && self.sink.is_some()
        {
            let Some(command) = self.queue.pop_offline() else {
                break;
            };
            self.write_command(command).await;
        }
    }

    // --- connection establishment ---

    fn begin_connecting(&mut self) {
        self.set_status(ConnectionStatus::Connecting);
        self.epoch += 1;
        let epoch = self.epoch;
        self.connect_timer = Some(Box::pin(sleep(self.config.connect_timeout)));
        let connector = self.connector.clone();
        let tx = self.tx.clone();
        debug!(epoch, "Opening transport to {}.", self.config.address());
        self.opener = Some(tokio::spawn(async move {
            let result = connector.open().await;
            let _ = tx.send(DriverMessage::Opened { epoch, result });
        }));
    }

    async fn on_opened(&mut self, epoch: u64, result: Result<TransportPair, ClientError>) {
        if epoch != self.epoch {
            // A stale attempt from before a teardown; close it politely.
            if let Ok(pair) = result {
                let mut sink = pair.sink;
                tokio::spawn(async move {
                    let _ = sink.shutdown().await;
                });
            }
            return;
        }
        self.opener = None;
        match result {
            Ok(pair) => {
                // Disarm the instant the transport reports open.
                self.connect_timer = None;
                self.sink = Some(pair.sink);
                self.spawn_reader(pair.stream);
                self.set_status(ConnectionStatus::Connect);
                self.events.publish(ClientEvent::Connect);
                self.run_bootstrap().await;
            }
            Err(e) => {
                self.connection_lost(Some(e)).await;
            }
        }
    }

    fn spawn_reader(&mut self, mut stream: Box<dyn ReplyStream>) {
        let tx = self.tx.clone();
        let epoch = self.epoch;
        self.reader = Some(tokio::spawn(async move {
            loop {
                match stream.next_reply().await {
                    Ok(Some(value)) => {
                        if tx.send(DriverMessage::Reply { epoch, value }).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        let _ = tx.send(DriverMessage::TransportClosed { epoch, error: None });
                        break;
                    }
                    Err(e) => {
                        let _ = tx.send(DriverMessage::TransportClosed {
                            epoch,
                            error: Some(e),
                        });
                        break;
                    }
                }
            }
        }));
    }

    async fn run_bootstrap(&mut self) {
        let sequence = SessionBootstrapper::setup_sequence(&self.config);
        self.pending_bootstrap = sequence.len();
        if sequence.is_empty() {
            self.on_ready().await;
            return;
        }
        debug!(
            "Running session bootstrap ({} commands).",
            self.pending_bootstrap
        );
        for mut command in sequence {
            command.seq = self.queue.assign_seq();
            self.write_command(command).await;
            if self.status != ConnectionStatus::Connect {
                // A write failure already tore the connection down.
                return;
            }
        }
    }

    async fn on_ready(&mut self) {
        self.retry_attempts = 0;
        self.last_error = None;
        self.set_status(ConnectionStatus::Ready);
        self.events.publish(ClientEvent::Ready);
        for waiter in self.connect_waiters.drain(..) {
            let _ = waiter.send(Ok(()));
        }

        // Restore subscriptions ahead of any queued traffic; queued commands
        // hold until every restoration command is fully acknowledged.
        let restore = SessionBootstrapper::restore_sequence(&self.subscriptions);
        self.pending_resubscribe = restore.len();
        if !restore.is_empty() {
            info!(
                "Restoring {} subscription command(s) after reconnect.",
                self.pending_resubscribe
            );
        }
        for mut command in restore {
            command.seq = self.queue.assign_seq();
            self.write_command(command).await;
            if self.status != ConnectionStatus::Ready {
                return;
            }
        }
        if self.pending_resubscribe == 0 {
            self.flush_offline().await;
        }
    }

    // --- reply handling ---

    async fn on_reply(&mut self, epoch: u64, value: RespValue) {
        if epoch != self.epoch {
            return;
        }
        if let Some(push) = classify_push(&value) {
            match push {
                PushFrame::Message { channel, payload } => {
                    self.events.publish_message(PushMessage {
                        channel,
                        pattern: None,
                        payload,
                    });
                }
                PushFrame::PMessage {
                    pattern,
                    channel,
                    payload,
                } => {
                    self.events.publish_message(PushMessage {
                        channel,
                        pattern: Some(pattern),
                        payload,
                    });
                }
                PushFrame::Ack {
                    kind,
                    op,
                    name,
                    active,
                } => {
                    self.on_subscription_ack(kind, op, name, active, value).await;
                }
            }
            return;
        }
        self.on_plain_reply(value).await;
    }

    async fn on_subscription_ack(
        &mut self,
        kind: SubscriptionKind,
        op: AckOp,
        name: Option<Bytes>,
        active: i64,
        value: RespValue,
    ) {
        if let Some(name) = &name {
            self.subscriptions.apply_ack(kind, op, name);
        }
        debug!(active, "Subscription acknowledgement received.");

        let Some(front) = self.queue.front_in_flight_mut() else {
            warn!("Subscription acknowledgement with no pending command.");
            return;
        };
        if front.expected_acks == 0 {
            warn!(name = %front.name, "Subscription acknowledgement did not match the pending command.");
            return;
        }
        front.expected_acks -= 1;
        if front.expected_acks > 0 {
            return;
        }

        let Some(mut command) = self.queue.pop_in_flight() else {
            return;
        };
        let origin = command.origin;
        if command.resolve(Ok(value)).is_err() {
            warn!(seq = command.seq, "Subscription command was already settled.");
        }
        if origin == CommandOrigin::Resubscribe {
            self.pending_resubscribe = self.pending_resubscribe.saturating_sub(1);
            if self.pending_resubscribe == 0 && self.status == ConnectionStatus::Ready {
                debug!("Subscription restoration acknowledged; flushing queued commands.");
                self.flush_offline().await;
            }
        }
    }

    async fn on_plain_reply(&mut self, value: RespValue) {
        let Some(mut command) = self.queue.pop_in_flight() else {
            warn!("Received a reply with no pending command: {:?}", value);
            return;
        };

        match command.origin {
            CommandOrigin::Bootstrap { fatal } => {
                self.pending_bootstrap = self.pending_bootstrap.saturating_sub(1);
                if let RespValue::Error(message) = &value {
                    if fatal {
                        error!("Authentication failed: {message}");
                        let auth_error = ClientError::AuthenticationFailed(message.clone());
                        self.events.publish(ClientEvent::Error(auth_error.clone()));
                        self.fail_terminally(auth_error).await;
                        return;
                    }
                    warn!(command = %command.name, "Setup command failed: {message}");
                    self.events
                        .publish(ClientEvent::Error(ClientError::BootstrapCommandFailed {
                            command: command.name.clone(),
                            message: message.clone(),
                        }));
                }
                if self.pending_bootstrap == 0 && self.status == ConnectionStatus::Connect {
                    self.on_ready().await;
                }
            }
            CommandOrigin::Quit => {
                let result = match &value {
                    RespValue::Error(message) => Err(ClientError::Server(message.clone())),
                    _ => Ok(value.clone()),
                };
                let succeeded = result.is_ok();
                if command.resolve(result).is_err() {
                    warn!(seq = command.seq, "QUIT result was already settled.");
                }
                if succeeded {
                    info!("QUIT acknowledged; connection ended.");
                    self.retry_timer = None;
                    let had_transport = self.teardown_transport().await;
                    if had_transport {
                        self.events.publish(ClientEvent::Close);
                    }
                    let error = ClientError::ConnectionClosed;
                    self.queue.reject_all(&error);
                    self.fail_connect_waiters(&error);
                    self.set_status(ConnectionStatus::End);
                    self.events.publish(ClientEvent::End);
                }
            }
            CommandOrigin::Resubscribe => {
                // Restoration acks normally arrive as push frames; tolerate a
                // server that replies plainly.
                self.pending_resubscribe = self.pending_resubscribe.saturating_sub(1);
                let _ = command.resolve(Ok(value));
                if self.pending_resubscribe == 0 && self.status == ConnectionStatus::Ready {
                    self.flush_offline().await;
                }
            }
            CommandOrigin::User => {
                let result = match value {
                    RespValue::Error(message) => Err(ClientError::Server(message)),
                    v => Ok(v),
                };
                if command.resolve(result).is_err() {
                    warn!(seq = command.seq, "Command result was already settled.");
                }
            }
        }
    }

    // --- failure and teardown ---

    /// The close/reconnect path taken for every transport-level failure,
    /// including open failures and the connect timeout.
    async fn connection_lost(&mut self, error: Option<ClientError>) {
        if self.status == ConnectionStatus::End {
            return;
        }
        if let Some(e) = &error {
            self.events.publish(ClientEvent::Error(e.clone()));
        }
        self.teardown_transport().await;
        self.set_status(ConnectionStatus::Close);
        self.events.publish(ClientEvent::Close);

        if self.config.auto_resend_unfulfilled {
            self.queue.requeue_unfulfilled();
        } else {
            let reject_with = error.clone().unwrap_or(ClientError::ConnectionClosed);
            self.queue.reject_in_flight(&reject_with);
        }
        if error.is_some() {
            self.last_error = error;
        }
        self.schedule_retry().await;
    }

    async fn schedule_retry(&mut self) {
        self.retry_attempts += 1;
        let attempt = self.retry_attempts;
        let ctx = RetryContext {
            attempt,
            last_error: self.last_error.clone(),
        };
        let decision = self
            .config
            .retry
            .as_ref()
            .and_then(|strategy| strategy.next_delay(&ctx, self.config.max_retry_delay));

        match decision {
            Some(delay) => {
                info!("Will try to reconnect in {delay:?} (attempt {attempt}).");
                self.set_status(ConnectionStatus::Reconnecting);
                self.events
                    .publish(ClientEvent::Reconnecting { delay, attempt });
                self.retry_timer = Some(Box::pin(sleep(delay)));
            }
            None => {
                info!("Retry strategy declined further attempts; connection ended.");
                // Only the first attempt's failure is observable through the
                // connect() future; later attempts end with ConnectionEnded.
                let waiter_error = if attempt == 1 {
                    self.last_error
                        .clone()
                        .unwrap_or(ClientError::ConnectionEnded)
                } else {
                    ClientError::ConnectionEnded
                };
                self.queue.reject_all(&ClientError::ConnectionEnded);
                self.fail_connect_waiters(&waiter_error);
                self.set_status(ConnectionStatus::End);
                self.events.publish(ClientEvent::End);
            }
        }
    }

    /// Terminal failure that must not consult the retry strategy (AUTH).
    async fn fail_terminally(&mut self, error: ClientError) {
        self.retry_timer = None;
        let had_transport = self.teardown_transport().await;
        if had_transport {
            self.events.publish(ClientEvent::Close);
        }
        self.queue.reject_all(&error);
        self.fail_connect_waiters(&error);
        self.set_status(ConnectionStatus::End);
        self.events.publish(ClientEvent::End);
    }

    /// Invalidates the current transport, pending open, and reader pump.
    /// Returns whether a live transport was actually present.
    async fn teardown_transport(&mut self) -> bool {
        self.epoch += 1;
        self.connect_timer = None;
        if let Some(handle) = self.opener.take() {
            handle.abort();
        }
        if let Some(handle) = self.reader.take() {
            handle.abort();
        }
        self.pending_bootstrap = 0;
        self.pending_resubscribe = 0;
        match self.sink.take() {
            Some(mut sink) => {
                let _ = sink.shutdown().await;
                true
            }
            None => false,
        }
    }

    fn fail_connect_waiters(&mut self, error: &ClientError) {
        for waiter in self.connect_waiters.drain(..) {
            let _ = waiter.send(Err(error.clone()));
        }
    }

    async fn on_connect_timeout(&mut self) {
        self.connect_timer = None;
        warn!(
            "Connect timeout after {:?}; treating as a transport error.",
            self.config.connect_timeout
        );
        self.connection_lost(Some(ClientError::ConnectTimeout)).await;
    }

    async fn on_retry_due(&mut self) {
        self.retry_timer = None;
        self.begin_connecting();
    }

    async fn on_handles_dropped(&mut self) {
        debug!("All client handles dropped; shutting down driver.");
        self.retry_timer = None;
        self.teardown_transport().await;
        self.queue.reject_all(&ClientError::ConnectionClosed);
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            debug!("Status transition: {} -> {}.", self.status, status);
            self.status = status;
            *self.shared_status.write() = status;
        }
    }
}
