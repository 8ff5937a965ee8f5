// src/connection/pipeline.rs

//! A batch builder that submits buffered commands as one ordered unit.

use crate::connection::client::{Client, driver_gone};
use crate::connection::driver::ApiRequest;
use crate::core::command::{Command, CommandResult};
use crate::core::errors::ClientError;
use bytes::Bytes;
use futures::future::join_all;

/// Buffers commands and submits them atomically: the batch is enqueued as a
/// single unit, so no other submission on the same client interleaves with
/// it, and replies settle in batch order.
pub struct Pipeline {
    client: Client,
    commands: Vec<(String, Vec<Bytes>)>,
}

impl Pipeline {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            commands: Vec::new(),
        }
    }

    /// Appends a command to the batch.
    pub fn cmd(mut self, name: impl Into<String>, args: Vec<Bytes>) -> Self {
        self.commands.push((name.into(), args));
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Submits every buffered command and resolves with one result per
    /// command, in submission order. Individual failures (error replies,
    /// rejections) land in their slot; the batch itself only fails if the
    /// driver is gone.
    pub async fn exec(self) -> Result<Vec<CommandResult>, ClientError> {
        if self.commands.is_empty() {
            return Ok(Vec::new());
        }

        let mut commands = Vec::with_capacity(self.commands.len());
        let mut receivers = Vec::with_capacity(self.commands.len());
        for (name, args) in self.commands {
            let (command, rx) = Command::new(name, args);
            commands.push(command);
            receivers.push(rx);
        }

        self.client.send(ApiRequest::Batch { commands })?;

        let settled = join_all(receivers).await;
        Ok(settled
            .into_iter()
            .map(|result| result.unwrap_or_else(|_| Err(driver_gone())))
            .collect())
    }
}
