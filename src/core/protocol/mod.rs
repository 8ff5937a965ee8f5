// src/core/protocol/mod.rs

//! Decoded reply values and push-frame classification.

pub mod resp_value;
pub use resp_value::RespValue;

use crate::core::subscriptions::{AckOp, SubscriptionKind};
use bytes::Bytes;

/// A server-initiated frame that is not a direct reply to a pending command.
///
/// While a connection holds subscriptions, the server interleaves these with
/// regular replies. `message`/`pmessage` frames are pure deliveries;
/// `(p)subscribe`/`(p)unsubscribe` frames are acknowledgements that the
/// reply-matching logic counts against the command that caused them.
#[derive(Debug, Clone, PartialEq)]
pub enum PushFrame {
    Message {
        channel: Bytes,
        payload: Bytes,
    },
    PMessage {
        pattern: Bytes,
        channel: Bytes,
        payload: Bytes,
    },
    Ack {
        kind: SubscriptionKind,
        op: AckOp,
        /// The channel or pattern named by the acknowledgement. A bare
        /// UNSUBSCRIBE with nothing tracked acks with a null name.
        name: Option<Bytes>,
        /// The number of subscriptions still active on this connection.
        active: i64,
    },
}

/// Classifies a decoded value as a push frame, or `None` for a regular reply.
pub fn classify_push(value: &RespValue) -> Option<PushFrame> {
    let RespValue::Array(items) = value else {
        return None;
    };

    let head = match items.first() {
        Some(RespValue::BulkString(b)) => b.as_ref().to_ascii_lowercase(),
        Some(RespValue::SimpleString(s)) => s.to_ascii_lowercase().into_bytes(),
        _ => return None,
    };

    match head.as_slice() {
        b"message" if items.len() == 3 => Some(PushFrame::Message {
            channel: bulk_at(items, 1)?,
            payload: bulk_at(items, 2)?,
        }),
        b"pmessage" if items.len() == 4 => Some(PushFrame::PMessage {
            pattern: bulk_at(items, 1)?,
            channel: bulk_at(items, 2)?,
            payload: bulk_at(items, 3)?,
        }),
        b"subscribe" => ack(items, SubscriptionKind::Channel, AckOp::Add),
        b"unsubscribe" => ack(items, SubscriptionKind::Channel, AckOp::Remove),
        b"psubscribe" => ack(items, SubscriptionKind::Pattern, AckOp::Add),
        b"punsubscribe" => ack(items, SubscriptionKind::Pattern, AckOp::Remove),
        _ => None,
    }
}

fn ack(items: &[RespValue], kind: SubscriptionKind, op: AckOp) -> Option<PushFrame> {
    if items.len() != 3 {
        return None;
    }
    let name = match &items[1] {
        RespValue::BulkString(b) => Some(b.clone()),
        RespValue::Null => None,
        _ => return None,
    };
    let active = match &items[2] {
        RespValue::Integer(n) => *n,
        _ => return None,
    };
    Some(PushFrame::Ack {
        kind,
        op,
        name,
        active,
    })
}

fn bulk_at(items: &[RespValue], idx: usize) -> Option<Bytes> {
    match items.get(idx) {
        Some(RespValue::BulkString(b)) => Some(b.clone()),
        _ => None,
    }
}
