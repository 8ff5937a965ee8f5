// src/core/protocol/resp_value.rs

//! Defines the decoded value type exchanged with the transport layer.

use bytes::Bytes;

/// `RespValue` is the decoded form of a server reply.
///
/// The wire codec lives behind the transport boundary; the client core only
/// ever sees fully decoded values. Error replies are carried as a variant
/// rather than a `Result` so that FIFO reply matching stays uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    BulkString(Bytes),
    Integer(i64),
    Array(Vec<RespValue>),
    Null,
    NullArray,
    Error(String),
}

impl RespValue {
    /// A `+OK` simple string, the reply shape most setup commands produce.
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    /// Returns the payload of a string-shaped value, if this is one.
    pub fn as_bytes(&self) -> Option<Bytes> {
        match self {
            RespValue::SimpleString(s) => Some(Bytes::copy_from_slice(s.as_bytes())),
            RespValue::BulkString(b) => Some(b.clone()),
            _ => None,
        }
    }

    /// Returns the error message if this value is an error reply.
    pub fn as_error(&self) -> Option<&str> {
        match self {
            RespValue::Error(msg) => Some(msg),
            _ => None,
        }
    }
}
