//! Handles for feeding the connection manager from outside the worker.
//!
//! [`Outbox`] queues frames for the socket; [`IntentSender`] re-injects
//! connection intents (start, stop, reset) raised by commands or the host.

use tokio::sync::mpsc;

use super::error::{ManagerGone, OutboxError};
use crate::frame::Frame;

/// Connection-level intent processed by
/// [`ConnectionManager::handle_intent`](super::ConnectionManager::handle_intent).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Start connecting if stopped.
    Start,
    /// Stop and stay disconnected until the next start.
    Stop,
    /// Drop the current socket and reconnect immediately.
    Reset,
}

/// Bounded queue of frames waiting to be written to the socket.
///
/// Frames queued while disconnected are discarded when the next connection
/// is established, so a reconnect never replays stale requests.
#[derive(Clone, Debug)]
pub struct Outbox {
    tx: mpsc::Sender<Frame>,
}

impl Outbox {
    /// Create an outbox and the receiver drained by the connection worker.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue `frame` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Full`] when the queue is at capacity and
    /// [`OutboxError::Closed`] when the receiving side is gone.
    pub fn try_send(&self, frame: Frame) -> Result<(), OutboxError> {
        self.tx.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => OutboxError::Full,
            mpsc::error::TrySendError::Closed(_) => OutboxError::Closed,
        })
    }

    /// Queue `frame`, waiting for capacity.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Closed`] when the receiving side is gone.
    pub async fn send(&self, frame: Frame) -> Result<(), OutboxError> {
        self.tx.send(frame).await.map_err(|_| OutboxError::Closed)
    }
}

/// Sender half of the intent channel.
#[derive(Clone, Debug)]
pub struct IntentSender {
    tx: mpsc::UnboundedSender<Intent>,
}

impl IntentSender {
    /// Create a sender and the receiver consumed by the manager.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Intent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Submit `intent`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerGone`] if the manager has been dropped.
    pub fn send(&self, intent: Intent) -> Result<(), ManagerGone> {
        self.tx.send(intent).map_err(|_| ManagerGone)
    }
}
