// src/core/queue.rs

//! The ordered holding areas for commands: offline and in-flight.
//!
//! A command lives in at most one of the two queues at any time. Both are
//! FIFO by submission order, and replies from the transport are matched
//! against the in-flight queue strictly front-first, mirroring the
//! protocol's guarantee that reply order equals request order.

use crate::core::command::{Command, CommandOrigin};
use crate::core::errors::ClientError;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Holds commands that are waiting for a usable connection (`offline`) and
/// commands that were written to the transport but not yet replied to
/// (`in_flight`).
#[derive(Debug, Default)]
pub struct CommandQueue {
    offline: VecDeque<Command>,
    in_flight: VecDeque<Command>,
    /// Offline-queue high-water mark. Zero disables the bound.
    limit: usize,
    next_seq: u64,
}

impl CommandQueue {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    /// The next logical submission index.
    pub fn assign_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Appends a command to the offline queue, or hands it back if the
    /// configured high-water mark is reached.
    pub fn enqueue_offline(&mut self, cmd: Command) -> Result<(), Command> {
        if self.limit > 0 && self.offline.len() >= self.limit {
            return Err(cmd);
        }
        debug!(seq = cmd.seq, name = %cmd.name, "Queued command offline.");
        self.offline.push_back(cmd);
        Ok(())
    }

    /// Puts a command back at the front of the offline queue. Used by replay
    /// paths, which bypass the high-water mark: these commands were already
    /// accepted once.
    pub fn requeue_front(&mut self, cmd: Command) {
        self.offline.push_front(cmd);
    }

    pub fn pop_offline(&mut self) -> Option<Command> {
        self.offline.pop_front()
    }

    /// Records a command as written to the transport and awaiting its reply.
    pub fn push_in_flight(&mut self, cmd: Command) {
        self.in_flight.push_back(cmd);
    }

    pub fn front_in_flight_mut(&mut self) -> Option<&mut Command> {
        self.in_flight.front_mut()
    }

    /// Removes and returns the command owed the next reply.
    pub fn pop_in_flight(&mut self) -> Option<Command> {
        self.in_flight.pop_front()
    }

    /// Moves unfulfilled in-flight commands back to the *front* of the
    /// offline queue, preserving their submission order so they replay ahead
    /// of commands submitted during the outage.
    ///
    /// Bootstrap and resubscription commands are regenerated on every
    /// connect, so they are dropped here rather than replayed stale.
    pub fn requeue_unfulfilled(&mut self) {
        while let Some(cmd) = self.in_flight.pop_back() {
            match cmd.origin {
                CommandOrigin::Bootstrap { .. } | CommandOrigin::Resubscribe => {
                    debug!(name = %cmd.name, "Dropping unfulfilled setup command; it will be rebuilt on reconnect.");
                }
                _ => self.offline.push_front(cmd),
            }
        }
    }

    /// Rejects every in-flight command with a clone of `error`.
    pub fn reject_in_flight(&mut self, error: &ClientError) {
        for mut cmd in self.in_flight.drain(..) {
            if cmd.resolve(Err(error.clone())).is_err() {
                warn!(seq = cmd.seq, name = %cmd.name, "In-flight command was already settled.");
            }
        }
    }

    /// Rejects every queued command, offline and in-flight, with a clone of
    /// `error`.
    pub fn reject_all(&mut self, error: &ClientError) {
        self.reject_in_flight(error);
        for mut cmd in self.offline.drain(..) {
            if cmd.resolve(Err(error.clone())).is_err() {
                warn!(seq = cmd.seq, name = %cmd.name, "Offline command was already settled.");
            }
        }
    }

    pub fn offline_len(&self) -> usize {
        self.offline.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offline.is_empty() && self.in_flight.is_empty()
    }
}
