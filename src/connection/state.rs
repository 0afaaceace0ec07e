//! Connection state and transition publication.

use std::fmt;

use tokio::sync::watch;

use crate::notify::{ConnectionStatusChange, Notification, Notifier};

/// Lifecycle state of the connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No socket. Either stopped or waiting to reconnect.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The socket is open; the handshake has not completed.
    Connected,
    /// The peer answered the handshake.
    Active,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Active => "active",
        })
    }
}

/// Current state plus the channel transitions are announced on.
///
/// Only the manager and its worker hold one; they never transition
/// concurrently because the manager transitions before spawning the worker
/// and after joining it.
#[derive(Debug)]
pub(crate) struct StatusCell {
    tx: watch::Sender<ConnectionState>,
    notifier: Notifier,
}

impl StatusCell {
    pub(crate) fn new(notifier: Notifier) -> Self {
        let (tx, _) = watch::channel(ConnectionState::Disconnected);
        Self { tx, notifier }
    }

    pub(crate) fn current(&self) -> ConnectionState { *self.tx.borrow() }

    pub(crate) fn watch(&self) -> watch::Receiver<ConnectionState> { self.tx.subscribe() }

    /// Move to `next`, publishing the change. Returns `false` when already
    /// in `next`.
    pub(crate) fn transition(&self, next: ConnectionState) -> bool {
        self.transition_if(|_| true, next)
    }

    /// Move to `next` only when the current state satisfies `allowed`.
    pub(crate) fn transition_if(
        &self,
        allowed: impl FnOnce(ConnectionState) -> bool,
        next: ConnectionState,
    ) -> bool {
        let mut previous = next;
        let changed = self.tx.send_if_modified(|state| {
            if *state == next || !allowed(*state) {
                return false;
            }
            previous = std::mem::replace(state, next);
            true
        });
        if changed {
            tracing::info!(from = %previous, to = %next, "connection state changed");
            self.notifier
                .publish(Notification::Status(ConnectionStatusChange {
                    previous,
                    current: next,
                }));
        }
        changed
    }
}
