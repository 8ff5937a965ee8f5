// src/core/bootstrap.rs

//! Builds the ordered replay prefix that runs silently after every
//! successful transport establishment, before any user traffic.

use crate::config::Config;
use crate::core::command::{Command, CommandOrigin};
use crate::core::subscriptions::SubscriptionSet;
use bytes::Bytes;

/// Produces the fixed-order setup sequence for a fresh connection.
///
/// The order is load-bearing:
/// 1. AUTH must be the very first command on the wire; nothing else is legal
///    before it on a password-protected server. Its failure is fatal.
/// 2. SELECT restores the database index (skipped for the default db 0).
/// 3. CLIENT SETNAME must precede any replayed subscribe, because subscribe
///    mode restricts which commands may subsequently run.
/// 4. READONLY must precede the first user command on the new connection.
/// 5. Subscription restoration follows, ahead of the unfulfilled and offline
///    queues that the driver flushes once the connection is ready.
pub struct SessionBootstrapper;

impl SessionBootstrapper {
    /// The setup commands proper (steps 1-4). Their replies are consumed
    /// internally and never exposed to callers.
    pub fn setup_sequence(config: &Config) -> Vec<Command> {
        let mut sequence = Vec::new();

        if let Some(password) = &config.password {
            sequence.push(Command::internal(
                "AUTH",
                vec![Bytes::copy_from_slice(password.as_bytes())],
                CommandOrigin::Bootstrap { fatal: true },
            ));
        }

        if config.db != 0 {
            sequence.push(Command::internal(
                "SELECT",
                vec![Bytes::from(config.db.to_string())],
                CommandOrigin::Bootstrap { fatal: false },
            ));
        }

        if let Some(name) = &config.connection_name {
            sequence.push(Command::internal(
                "CLIENT",
                vec![
                    Bytes::from_static(b"SETNAME"),
                    Bytes::copy_from_slice(name.as_bytes()),
                ],
                CommandOrigin::Bootstrap { fatal: false },
            ));
        }

        if config.read_only {
            sequence.push(Command::internal(
                "READONLY",
                vec![],
                CommandOrigin::Bootstrap { fatal: false },
            ));
        }

        sequence
    }

    /// The subscription-restoration commands (step 5). Each expects one push
    /// acknowledgement per subscribed name.
    pub fn restore_sequence(subscriptions: &SubscriptionSet) -> Vec<Command> {
        subscriptions
            .restore_commands()
            .into_iter()
            .map(|(name, args)| {
                let mut cmd = Command::internal(name, args, CommandOrigin::Resubscribe);
                cmd.expected_acks = cmd.args.len() as u32;
                cmd
            })
            .collect()
    }

    /// The full replay prefix in wire order: setup, then restoration.
    pub fn sequence(config: &Config, subscriptions: &SubscriptionSet) -> Vec<Command> {
        let mut sequence = Self::setup_sequence(config);
        sequence.extend(Self::restore_sequence(subscriptions));
        sequence
    }
}
