// src/config.rs

//! Manages client configuration: recognized options, defaults, and loading.

use crate::core::retry::RetryStrategy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// The full set of options recognized by a client instance.
///
/// Fields are public and mutated directly before the client is constructed,
/// or deserialized from an embedding application's TOML. The retry strategy
/// is a function value and therefore skipped by serde; deserialized configs
/// get the built-in backoff.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
    /// The database index restored on every (re)connect.
    #[serde(default)]
    pub db: usize,
    /// How long a single transport-open attempt may take before it is
    /// treated as a transport error.
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    /// `None` disables reconnects entirely: the first transport failure is
    /// terminal.
    #[serde(skip, default = "default_retry")]
    pub retry: Option<RetryStrategy>,
    /// Upper bound applied to whatever delay the retry strategy returns.
    #[serde(with = "humantime_serde", default = "default_max_retry_delay")]
    pub max_retry_delay: Duration,
    /// Skip the automatic connect on construction; the first submitted
    /// command (or an explicit `connect()`) starts the connection instead.
    #[serde(default)]
    pub lazy_connect: bool,
    /// Sent via CLIENT SETNAME during session bootstrap when set.
    #[serde(default)]
    pub connection_name: Option<String>,
    /// Issue READONLY during session bootstrap.
    #[serde(default)]
    pub read_only: bool,
    /// Resend commands that were written to a transport that broke before
    /// replying. When false such commands are rejected instead.
    #[serde(default = "default_true")]
    pub auto_resend_unfulfilled: bool,
    /// Allow commands submitted after the connection ended to queue until an
    /// explicit reconnect. When false they fail fast.
    #[serde(default = "default_true")]
    pub enable_offline_queue: bool,
    /// Rejects new submissions once the offline queue holds this many
    /// commands. `0` disables the bound.
    #[serde(default)]
    pub offline_queue_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            db: 0,
            connect_timeout: default_connect_timeout(),
            retry: default_retry(),
            max_retry_delay: default_max_retry_delay(),
            lazy_connect: false,
            connection_name: None,
            read_only: false,
            auto_resend_unfulfilled: true,
            enable_offline_queue: true,
            offline_queue_limit: 0,
        }
    }
}

impl Config {
    /// Loads a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
        Ok(config)
    }

    /// The `host:port` pair a connector should dial.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7878
}
fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_retry() -> Option<RetryStrategy> {
    Some(RetryStrategy::default())
}
fn default_max_retry_delay() -> Duration {
    Duration::from_secs(60)
}
fn default_true() -> bool {
    true
}
