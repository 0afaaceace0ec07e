//! Command handlers bound to event kinds.
//!
//! A [`Command`] executes the effect of one [`Event`]. Commands run on the
//! connection's read task and must return quickly; work that blocks should
//! be handed to another task. Whatever a command does outside its own state
//! goes through the [`CommandContext`]: publishing notifications, queuing
//! frames for the peer, or raising connection intents.

use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
};

use thiserror::Error;

use crate::{
    connection::{Intent, IntentSender, ManagerGone, Outbox, OutboxError},
    event::Event,
    frame::Frame,
    notify::{Notification, Notifier},
};

pub mod builtin;
mod registry;

pub use registry::CommandRegistry;

/// Failure reported by a command. Logged and counted; never propagated past
/// the command invocation.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete its effect.
    #[error("command failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The outbound queue is full.
    #[error("outbound queue is full")]
    Backpressure,
    /// The connection manager is gone.
    #[error("connection manager has shut down")]
    Closed,
    /// The command panicked.
    #[error("command panicked: {0}")]
    Panicked(String),
}

impl CommandError {
    /// Wrap an arbitrary error or message as [`CommandError::Failed`].
    pub fn failed(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(error.into())
    }
}

impl From<OutboxError> for CommandError {
    fn from(value: OutboxError) -> Self {
        match value {
            OutboxError::Full => Self::Backpressure,
            OutboxError::Closed => Self::Closed,
        }
    }
}

impl From<ManagerGone> for CommandError {
    fn from(_: ManagerGone) -> Self { Self::Closed }
}

/// Handler executing the effect of one event kind.
pub trait Command: Send + Sync + 'static {
    /// Apply `event`.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the effect could not be applied.
    fn execute(&self, event: &Event, ctx: &CommandContext) -> Result<(), CommandError>;
}

impl<F> Command for F
where
    F: Fn(&Event, &CommandContext) -> Result<(), CommandError> + Send + Sync + 'static,
{
    fn execute(&self, event: &Event, ctx: &CommandContext) -> Result<(), CommandError> {
        self(event, ctx)
    }
}

/// Per-connection facts commands may record.
#[derive(Debug, Default)]
pub struct Session {
    activation_requested: AtomicBool,
    peer_protocol: AtomicU32,
}

impl Session {
    /// Ask for the connection to be promoted to
    /// [`Active`](crate::connection::ConnectionState::Active).
    pub fn request_activation(&self) { self.activation_requested.store(true, Ordering::Release); }

    /// Consume a pending activation request.
    pub fn take_activation_request(&self) -> bool {
        self.activation_requested.swap(false, Ordering::AcqRel)
    }

    /// Protocol version announced by the peer, if any.
    #[must_use]
    pub fn peer_protocol(&self) -> Option<u32> {
        match self.peer_protocol.load(Ordering::Acquire) {
            0 => None,
            version => Some(version),
        }
    }

    pub fn set_peer_protocol(&self, version: u32) {
        self.peer_protocol.store(version, Ordering::Release);
    }

    /// Forget everything learned on the previous connection.
    pub fn clear(&self) {
        self.activation_requested.store(false, Ordering::Release);
        self.peer_protocol.store(0, Ordering::Release);
    }
}

/// Capabilities handed to commands.
#[derive(Clone, Debug)]
pub struct CommandContext {
    notifier: Notifier,
    outbox: Outbox,
    intents: IntentSender,
    session: Arc<Session>,
}

impl CommandContext {
    /// Bundle the capabilities of one connection's commands.
    #[must_use]
    pub fn new(
        notifier: Notifier,
        outbox: Outbox,
        intents: IntentSender,
        session: Arc<Session>,
    ) -> Self {
        Self {
            notifier,
            outbox,
            intents,
            session,
        }
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier { &self.notifier }

    #[must_use]
    pub fn session(&self) -> &Session { &self.session }

    /// Publish a notification to subscribers.
    pub fn publish(&self, notification: Notification) { self.notifier.publish(notification); }

    /// Queue `frame` for the peer without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Backpressure`] when the outbox is full and
    /// [`CommandError::Closed`] when the connection manager is gone.
    pub fn send(&self, frame: Frame) -> Result<(), CommandError> { Ok(self.outbox.try_send(frame)?) }

    /// Raise a connection intent.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Closed`] when the connection manager is gone.
    pub fn request(&self, intent: Intent) -> Result<(), CommandError> {
        Ok(self.intents.send(intent)?)
    }

    /// Promote the connection to active once the current chunk is processed.
    pub fn activate(&self) { self.session.request_activation(); }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else {
        format!("{payload:?}")
    }
}

/// Run `command`, turning a panic into [`CommandError::Panicked`].
pub(crate) fn execute_isolated(
    command: &dyn Command,
    event: &Event,
    ctx: &CommandContext,
) -> Result<(), CommandError> {
    catch_unwind(AssertUnwindSafe(|| command.execute(event, ctx)))
        .unwrap_or_else(|payload| Err(CommandError::Panicked(panic_message(payload.as_ref()))))
}
