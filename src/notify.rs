//! Typed one-way notification channel towards subscribers.
//!
//! The connection worker and the commands publish [`Notification`]s through
//! a [`Notifier`] that is handed to them at construction. Subscribers (a UI,
//! a logger) call [`Notifier::subscribe`] and receive every notification
//! published after that point.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::{connection::ConnectionState, event::Event};

/// Default number of notifications buffered per subscriber.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

/// A connection state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionStatusChange {
    pub previous: ConnectionState,
    pub current: ConnectionState,
}

/// Message delivered to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// The connection changed state.
    Status(ConnectionStatusChange),
    /// A reconnect attempt will be made after `delay`.
    ReconnectScheduled {
        /// One-based attempt counter since the last successful connect.
        attempt: u32,
        delay: Duration,
    },
    /// A decoded event republished by a command.
    Event(Event),
}

/// Broadcast handle used to publish notifications.
///
/// Cloning the handle is cheap; all clones feed the same subscribers.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    /// Create a notifier buffering up to `capacity` notifications for each
    /// subscriber. Slow subscribers lose the oldest notifications.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> { self.tx.subscribe() }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize { self.tx.receiver_count() }

    /// Publish `notification`, returning how many subscribers received it.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, notification: Notification) -> usize {
        match self.tx.send(notification) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(dropped)) => {
                tracing::trace!(?dropped, "notification published without subscribers");
                0
            }
        }
    }
}

impl Default for Notifier {
    fn default() -> Self { Self::new(DEFAULT_NOTIFICATION_CAPACITY) }
}
