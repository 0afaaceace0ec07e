//! Errors raised by the connection layer.

use std::{io, time::Duration};

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Reasons a connection attempt or an established connection ended.
///
/// These never escape the connection worker: they are logged and answered
/// with a reconnect.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The socket could not be opened.
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),
    /// The connect attempt exceeded the configured timeout.
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
    /// Reading from or writing to the socket failed.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Eof,
    /// The byte stream became unusable.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Failure to enqueue an outbound frame.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum OutboxError {
    /// The outbound queue is at capacity.
    #[error("outbound queue is full")]
    Full,
    /// The connection manager has been dropped.
    #[error("connection manager has shut down")]
    Closed,
}

/// The connection manager has been dropped and no longer accepts intents.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("connection manager has shut down")]
pub struct ManagerGone;
