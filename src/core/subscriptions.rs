// src/core/subscriptions.rs

//! Tracks the channels and patterns this connection is subscribed to.
//!
//! The set is the source of truth for subscription restoration after a
//! reconnect. It is mutated only by acknowledged (p)subscribe and
//! (p)unsubscribe replies, never optimistically at submission time, so it can
//! never contain an entry whose unsubscribe was already acknowledged.

use bytes::Bytes;
use std::collections::BTreeSet;

/// Whether a subscription names a concrete channel or a glob-style pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    Channel,
    Pattern,
}

impl SubscriptionKind {
    /// The command that re-establishes subscriptions of this kind.
    pub fn subscribe_command(&self) -> &'static str {
        match self {
            SubscriptionKind::Channel => "SUBSCRIBE",
            SubscriptionKind::Pattern => "PSUBSCRIBE",
        }
    }
}

/// The direction of a subscription acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOp {
    Add,
    Remove,
}

/// The set of (kind, name) pairs currently subscribed.
///
/// `BTreeSet` keeps restoration commands in a deterministic order, which the
/// replay tests rely on.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionSet {
    channels: BTreeSet<Bytes>,
    patterns: BTreeSet<Bytes>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Applies one acknowledged subscription change.
    pub fn apply_ack(&mut self, kind: SubscriptionKind, op: AckOp, name: &Bytes) {
        let set = match kind {
            SubscriptionKind::Channel => &mut self.channels,
            SubscriptionKind::Pattern => &mut self.patterns,
        };
        match op {
            AckOp::Add => {
                set.insert(name.clone());
            }
            AckOp::Remove => {
                set.remove(name);
            }
        }
    }

    pub fn contains(&self, kind: SubscriptionKind, name: &Bytes) -> bool {
        match kind {
            SubscriptionKind::Channel => self.channels.contains(name),
            SubscriptionKind::Pattern => self.patterns.contains(name),
        }
    }

    pub fn count(&self, kind: SubscriptionKind) -> usize {
        match kind {
            SubscriptionKind::Channel => self.channels.len(),
            SubscriptionKind::Pattern => self.patterns.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.channels.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.patterns.is_empty()
    }

    /// The commands that rebuild this set on a fresh connection: at most one
    /// SUBSCRIBE carrying every channel and one PSUBSCRIBE carrying every
    /// pattern.
    pub fn restore_commands(&self) -> Vec<(&'static str, Vec<Bytes>)> {
        let mut commands = Vec::new();
        if !self.channels.is_empty() {
            commands.push((
                SubscriptionKind::Channel.subscribe_command(),
                self.channels.iter().cloned().collect(),
            ));
        }
        if !self.patterns.is_empty() {
            commands.push((
                SubscriptionKind::Pattern.subscribe_command(),
                self.patterns.iter().cloned().collect(),
            ));
        }
        commands
    }
}
