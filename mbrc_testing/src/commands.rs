//! Commands and contexts for observing dispatch in tests.

use std::sync::{Arc, Mutex, PoisonError};

use mbrc::{
    command::{Command, CommandContext, CommandError, Session},
    connection::{Intent, IntentSender, Outbox},
    event::Event,
    frame::Frame,
    notify::{Notification, Notifier},
};
use rstest::fixture;
use tokio::sync::{broadcast, mpsc};

/// Appends every event it executes to a shared journal.
///
/// Clones share the journal, so several kinds can record into one ordered
/// log.
#[derive(Clone, Debug, Default)]
pub struct RecordingCommand {
    journal: Arc<Mutex<Vec<Event>>>,
}

impl RecordingCommand {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Events executed so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Command for RecordingCommand {
    fn execute(&self, event: &Event, _ctx: &CommandContext) -> Result<(), CommandError> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Always fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingCommand;

impl Command for FailingCommand {
    fn execute(&self, event: &Event, _ctx: &CommandContext) -> Result<(), CommandError> {
        Err(CommandError::failed(format!("refusing {}", event.kind())))
    }
}

/// Always panics.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanickingCommand;

impl Command for PanickingCommand {
    fn execute(&self, event: &Event, _ctx: &CommandContext) -> Result<(), CommandError> {
        panic!("command exploded on {}", event.kind())
    }
}

/// A [`CommandContext`] with every channel end exposed.
pub struct TestContext {
    pub ctx: CommandContext,
    pub notifier: Notifier,
    pub notifications: broadcast::Receiver<Notification>,
    pub outbound: mpsc::Receiver<Frame>,
    pub intents: mpsc::UnboundedReceiver<Intent>,
    pub session: Arc<Session>,
}

impl TestContext {
    #[must_use]
    pub fn new(outbound_capacity: usize) -> Self {
        let notifier = Notifier::default();
        let notifications = notifier.subscribe();
        let (outbox, outbound) = Outbox::channel(outbound_capacity);
        let (intent_tx, intents) = IntentSender::channel();
        let session = Arc::new(Session::default());
        Self {
            ctx: CommandContext::new(notifier.clone(), outbox, intent_tx, Arc::clone(&session)),
            notifier,
            notifications,
            outbound,
            intents,
            session,
        }
    }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn test_context() -> TestContext { TestContext::new(16) }
