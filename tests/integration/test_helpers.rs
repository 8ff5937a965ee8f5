// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests.
//!
//! `MockServer` stands in for a RESP server behind the transport boundary:
//! it keeps a key/value map shared across connections, answers bootstrap
//! commands, emits subscription acknowledgements, and can be told to refuse
//! connection attempts or kill the live connection mid-flight.

use async_trait::async_trait;
use bytes::Bytes;
use spinel_client::{
    Client, ClientError, ClientEvent, CommandSink, Config, ConnectionStatus, Connector,
    ReplyStream, RespValue, TransportPair,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

/// One command as the server saw it, tagged with the connection it arrived on.
#[derive(Debug, Clone)]
pub struct LoggedCommand {
    pub connection: u64,
    pub name: String,
    pub args: Vec<Bytes>,
}

/// What travels from the server to a connection's reply stream.
enum Item {
    Value(RespValue),
    Close(Option<ClientError>),
}

struct ConnectionCtl {
    reply_tx: mpsc::UnboundedSender<Item>,
    closed: Arc<AtomicBool>,
}

struct ServerInner {
    password: Option<String>,
    kv: std::sync::Mutex<HashMap<Bytes, Bytes>>,
    log: std::sync::Mutex<Vec<LoggedCommand>>,
    /// Commands that should reply with an error, for bootstrap-failure tests.
    fail_commands: std::sync::Mutex<Vec<String>>,
    /// Commands the server accepts but never replies to, for
    /// unfulfilled-command tests.
    swallow_commands: std::sync::Mutex<Vec<String>>,
    /// The next N open() calls fail with a refused error.
    fail_connects: AtomicUsize,
    /// When set, open() never completes (connect-timeout tests).
    hold_open: AtomicBool,
    open_attempts: AtomicUsize,
    conn_counter: AtomicU64,
    current: std::sync::Mutex<Option<ConnectionCtl>>,
    subs: std::sync::Mutex<BTreeSet<Bytes>>,
    psubs: std::sync::Mutex<BTreeSet<Bytes>>,
}

#[derive(Clone)]
pub struct MockServer {
    inner: Arc<ServerInner>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::with_password(None)
    }

    pub fn with_password(password: Option<&str>) -> Self {
        Self {
            inner: Arc::new(ServerInner {
                password: password.map(str::to_string),
                kv: std::sync::Mutex::new(HashMap::new()),
                log: std::sync::Mutex::new(Vec::new()),
                fail_commands: std::sync::Mutex::new(Vec::new()),
                swallow_commands: std::sync::Mutex::new(Vec::new()),
                fail_connects: AtomicUsize::new(0),
                hold_open: AtomicBool::new(false),
                open_attempts: AtomicUsize::new(0),
                conn_counter: AtomicU64::new(0),
                current: std::sync::Mutex::new(None),
                subs: std::sync::Mutex::new(BTreeSet::new()),
                psubs: std::sync::Mutex::new(BTreeSet::new()),
            }),
        }
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(MockConnector {
            inner: self.inner.clone(),
        })
    }

    /// Refuse the next `n` connection attempts.
    pub fn fail_next_connects(&self, n: usize) {
        self.inner.fail_connects.store(n, Ordering::SeqCst);
    }

    /// Make every future open() hang until the timeout fires.
    pub fn hold_opens(&self, hold: bool) {
        self.inner.hold_open.store(hold, Ordering::SeqCst);
    }

    /// Reply with an error to every future occurrence of `name`.
    pub fn fail_command(&self, name: &str) {
        self.inner
            .fail_commands
            .lock()
            .unwrap()
            .push(name.to_ascii_uppercase());
    }

    /// Accept but never reply to every future occurrence of `name`.
    pub fn swallow_command(&self, name: &str) {
        self.inner
            .swallow_commands
            .lock()
            .unwrap()
            .push(name.to_ascii_uppercase());
    }

    pub fn clear_swallowed(&self) {
        self.inner.swallow_commands.lock().unwrap().clear();
    }

    pub fn open_attempts(&self) -> usize {
        self.inner.open_attempts.load(Ordering::SeqCst)
    }

    /// Abruptly kills the live connection, as a mid-flight socket failure.
    pub fn kill_connection(&self) {
        let ctl = self.inner.current.lock().unwrap().take();
        if let Some(ctl) = ctl {
            ctl.closed.store(true, Ordering::SeqCst);
            let _ = ctl.reply_tx.send(Item::Close(Some(ClientError::Transport(
                "connection reset by peer".to_string(),
            ))));
        }
        self.inner.subs.lock().unwrap().clear();
        self.inner.psubs.lock().unwrap().clear();
    }

    /// Pushes a pub/sub message to the live connection for `channel`.
    pub fn push_message(&self, channel: &str, payload: &str) {
        let current = self.inner.current.lock().unwrap();
        if let Some(ctl) = current.as_ref()
            && self.inner.subs.lock().unwrap().contains(channel.as_bytes())
        {
            let frame = RespValue::Array(vec![
                RespValue::BulkString(Bytes::from_static(b"message")),
                RespValue::BulkString(Bytes::copy_from_slice(channel.as_bytes())),
                RespValue::BulkString(Bytes::copy_from_slice(payload.as_bytes())),
            ]);
            let _ = ctl.reply_tx.send(Item::Value(frame));
        }
    }

    /// The server-side count of active subscriptions on the live connection.
    pub fn subscription_count(&self) -> usize {
        self.inner.subs.lock().unwrap().len() + self.inner.psubs.lock().unwrap().len()
    }

    /// Every command the server has seen, across all connections, in order.
    pub fn log(&self) -> Vec<LoggedCommand> {
        self.inner.log.lock().unwrap().clone()
    }

    /// The command names seen on the most recent connection, in order.
    pub fn last_connection_commands(&self) -> Vec<String> {
        let log = self.inner.log.lock().unwrap();
        let Some(last) = log.last().map(|c| c.connection) else {
            return Vec::new();
        };
        log.iter()
            .filter(|c| c.connection == last)
            .map(|c| c.name.clone())
            .collect()
    }
}

impl ServerInner {
    fn execute(&self, conn: u64, name: &str, args: &[Bytes]) -> Vec<Item> {
        let upper = name.to_ascii_uppercase();
        self.log.lock().unwrap().push(LoggedCommand {
            connection: conn,
            name: upper.clone(),
            args: args.to_vec(),
        });

        if self.swallow_commands.lock().unwrap().contains(&upper) {
            return Vec::new();
        }

        if self.fail_commands.lock().unwrap().contains(&upper) {
            return vec![Item::Value(RespValue::Error(format!(
                "ERR {upper} is failing for this test"
            )))];
        }

        match upper.as_str() {
            "AUTH" => {
                let supplied = args.first().map(|b| b.as_ref().to_vec());
                let expected = self.password.as_ref().map(|p| p.as_bytes().to_vec());
                if expected.is_none() || supplied == expected {
                    vec![Item::Value(RespValue::ok())]
                } else {
                    vec![Item::Value(RespValue::Error(
                        "WRONGPASS invalid password".to_string(),
                    ))]
                }
            }
            "SELECT" | "CLIENT" | "READONLY" | "PING" => vec![Item::Value(RespValue::ok())],
            "SET" => {
                if let (Some(key), Some(value)) = (args.first(), args.get(1)) {
                    self.kv.lock().unwrap().insert(key.clone(), value.clone());
                    vec![Item::Value(RespValue::ok())]
                } else {
                    vec![Item::Value(RespValue::Error(
                        "ERR wrong number of arguments for 'set' command".to_string(),
                    ))]
                }
            }
            "GET" => {
                let value = args
                    .first()
                    .and_then(|key| self.kv.lock().unwrap().get(key).cloned());
                vec![Item::Value(match value {
                    Some(v) => RespValue::BulkString(v),
                    None => RespValue::Null,
                })]
            }
            "QUIT" => vec![Item::Value(RespValue::ok()), Item::Close(None)],
            "SUBSCRIBE" | "PSUBSCRIBE" => {
                let (set, ack) = if upper == "SUBSCRIBE" {
                    (&self.subs, "subscribe")
                } else {
                    (&self.psubs, "psubscribe")
                };
                let mut items = Vec::new();
                for name in args {
                    set.lock().unwrap().insert(name.clone());
                    let total = self.subs.lock().unwrap().len() + self.psubs.lock().unwrap().len();
                    items.push(Item::Value(subscription_ack(ack, Some(name), total as i64)));
                }
                items
            }
            "UNSUBSCRIBE" | "PUNSUBSCRIBE" => {
                let (set, ack) = if upper == "UNSUBSCRIBE" {
                    (&self.subs, "unsubscribe")
                } else {
                    (&self.psubs, "punsubscribe")
                };
                let names: Vec<Bytes> = if args.is_empty() {
                    set.lock().unwrap().iter().cloned().collect()
                } else {
                    args.to_vec()
                };
                if names.is_empty() {
                    let total = self.subs.lock().unwrap().len() + self.psubs.lock().unwrap().len();
                    return vec![Item::Value(subscription_ack(ack, None, total as i64))];
                }
                let mut items = Vec::new();
                for name in &names {
                    set.lock().unwrap().remove(name);
                    let total = self.subs.lock().unwrap().len() + self.psubs.lock().unwrap().len();
                    items.push(Item::Value(subscription_ack(ack, Some(name), total as i64)));
                }
                items
            }
            other => vec![Item::Value(RespValue::Error(format!(
                "ERR unknown command '{other}'"
            )))],
        }
    }
}

fn subscription_ack(kind: &str, name: Option<&Bytes>, active: i64) -> RespValue {
    RespValue::Array(vec![
        RespValue::BulkString(Bytes::copy_from_slice(kind.as_bytes())),
        match name {
            Some(n) => RespValue::BulkString(n.clone()),
            None => RespValue::Null,
        },
        RespValue::Integer(active),
    ])
}

struct MockConnector {
    inner: Arc<ServerInner>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self) -> Result<TransportPair, ClientError> {
        self.inner.open_attempts.fetch_add(1, Ordering::SeqCst);

        if self.inner.hold_open.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let remaining = self.inner.fail_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.inner.fail_connects.store(remaining - 1, Ordering::SeqCst);
            return Err(ClientError::Transport("connection refused".to_string()));
        }

        let conn = self.inner.conn_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        // A new connection replaces the previous one; per-connection
        // subscription state starts empty.
        self.inner.subs.lock().unwrap().clear();
        self.inner.psubs.lock().unwrap().clear();
        *self.inner.current.lock().unwrap() = Some(ConnectionCtl {
            reply_tx: reply_tx.clone(),
            closed: closed.clone(),
        });

        Ok(TransportPair {
            sink: Box::new(MockSink {
                inner: self.inner.clone(),
                conn,
                reply_tx,
                closed,
            }),
            stream: Box::new(MockStream { reply_rx }),
        })
    }
}

struct MockSink {
    inner: Arc<ServerInner>,
    conn: u64,
    reply_tx: mpsc::UnboundedSender<Item>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl CommandSink for MockSink {
    async fn send(&mut self, name: &str, args: &[Bytes]) -> Result<(), ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("broken pipe".to_string()));
        }
        for item in self.inner.execute(self.conn, name, args) {
            if self.reply_tx.send(item).is_err() {
                return Err(ClientError::Transport("broken pipe".to_string()));
            }
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ClientError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct MockStream {
    reply_rx: mpsc::UnboundedReceiver<Item>,
}

#[async_trait]
impl ReplyStream for MockStream {
    async fn next_reply(&mut self) -> Result<Option<RespValue>, ClientError> {
        match self.reply_rx.recv().await {
            Some(Item::Value(value)) => Ok(Some(value)),
            Some(Item::Close(None)) | None => Ok(None),
            Some(Item::Close(Some(error))) => Err(error),
        }
    }
}

// --- client-side helpers ---

/// Sets up minimal tracing for tests and builds a client over the mock
/// server with the given config.
pub fn client_over(server: &MockServer, config: Config) -> Client {
    init_tracing();
    Client::new(config, server.connector())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();
}

/// Polls until the server has seen at least `at_least` open attempts,
/// panicking after two seconds. Used to observe that a reconnect actually
/// happened before asserting on post-reconnect state.
pub async fn wait_for_open_attempts(server: &MockServer, at_least: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while server.open_attempts() < at_least {
        if tokio::time::Instant::now() > deadline {
            panic!(
                "timed out waiting for {at_least} open attempts; saw {}",
                server.open_attempts()
            );
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Polls until the client reports `status`, panicking after two seconds.
pub async fn wait_for_status(client: &Client, status: ConnectionStatus) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while client.status() != status {
        if tokio::time::Instant::now() > deadline {
            panic!(
                "timed out waiting for status {status}; current status is {}",
                client.status()
            );
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Receives events until one matches `pred`, panicking after two seconds.
pub async fn wait_for_event(
    rx: &mut broadcast::Receiver<ClientEvent>,
    pred: impl Fn(&ClientEvent) -> bool,
) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("event channel closed while waiting: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for a lifecycle event")
}
